pub mod config;
pub mod reward;
pub mod selector;
pub mod store;
pub mod types;

pub use config::SelectorConfig;
pub use selector::{AdaptiveSelector, SelectorError};
pub use store::{JsonFileStore, MemoryStore, StoreError, TableDocument, TableStore};
pub use types::{
    Difficulty, ExerciseType, LevelCatalog, LevelSpec, Selection, SelectionSource, StateKey,
};

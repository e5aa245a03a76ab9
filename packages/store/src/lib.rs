pub mod cache;
pub mod clock;
pub mod invalidation;
pub mod key;
pub mod models;
pub mod validate;

pub use cache::{CacheEvent, CachePolicy, CachedQuery, QueryCache};
pub use clock::Clock;
pub use invalidation::InvalidationMap;
pub use key::QueryKey;
pub use validate::{FieldError, Validate};

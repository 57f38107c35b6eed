/// Type Model Module
///
/// Both sides of the type mapping live here:
/// - **Conceptual types** (`conceptual.rs`): engine-neutral primitive kinds refined by facets
/// - **Store types** (`store.rs`): SQLite type names as declared in a schema, with their facets
/// - **Facets** (`facet.rs`): the sparse, optionally-unbounded refinements shared by both
pub mod conceptual;
pub mod facet;
pub mod kind;
pub mod store;

pub use conceptual::TypeUsage;
pub use facet::{Facet, FacetSet};
pub use kind::PrimitiveKind;
pub use store::{StoreKind, StoreTypeUsage};

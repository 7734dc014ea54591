mod kind;
mod table;
mod uuid;

pub use kind::{AssetIndex, AssetKind};
pub use table::{AssetEntry, AssetTable, AssetTableBuilder, AssetTableError};
pub use uuid::{random_uuid, AssetUuid};

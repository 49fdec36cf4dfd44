pub mod ingest_metadata;
pub mod quadrant;

// Library root: cricket data model, scoring engine, feed ingestion, and the
// squad/leaderboard rules built on top of them.

pub mod ingest;
pub mod model;
pub mod scoring;
pub mod squad;
pub mod summary;

pub mod corpus;
pub mod db;

pub use corpus::load_corpus;
pub use db::PgStatsStore;

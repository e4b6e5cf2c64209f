pub mod config;
pub mod corpus;
pub mod link;
pub mod page;
pub mod record;
pub mod schema;
pub mod selection;
pub mod trace;

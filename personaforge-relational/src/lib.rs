/*!
# personaforge-relational

Relational Store (C4): users, turns, derived facts, and relationship state,
persisted with `rusqlite` (bundled). Schema initialization creates tables,
indexes, and a `metadata` schema-version row on construction.

A single `Connection` guarded by a `parking_lot::Mutex` backs the store
rather than a pool: write volume per conversation is low enough that
pooling would be premature here (documented in DESIGN.md).
*/

mod schema;
mod store;

pub use store::RelationalStore;

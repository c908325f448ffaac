//! Library to backup one or more [MongoDB][mongo] databases.
//!
//! Every configured database is dumped with [`mongodump`][mongodump] into a
//! gzip archive. The archive directory can optionally be committed and
//! force-pushed to a git remote. The individual steps live in the
//! [`backends`] module and are driven in order by [`run::Backup`].
//!
//! [mongo]: https://www.mongodb.com/
//! [mongodump]: https://www.mongodb.com/docs/database-tools/mongodump/

#![forbid(unsafe_code)]

pub mod backends;
pub mod cli;
pub mod config;
pub mod journal;
pub mod process;
pub mod run;

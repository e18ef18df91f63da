pub mod activity;
pub mod board;
pub mod column;
pub mod dashboard;
pub mod task;
pub mod token;
pub mod user;

use sqlx::{Sqlite, Transaction};

pub(crate) type Tx<'a> = Transaction<'a, Sqlite>;

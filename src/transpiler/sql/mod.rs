pub mod db2;
pub mod firebird;
pub mod mysql;
pub mod postgres;
pub mod sqlce;
pub mod sqlite;
pub mod sqlserver;

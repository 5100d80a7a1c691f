use crate::transpiler::traits::SqlGenerator;

pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn upper_function(&self) -> &str {
        "UPPER"
    }
}

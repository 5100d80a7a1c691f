use crate::transpiler::traits::SqlGenerator;

/// Firebird 3+.
pub struct FirebirdGenerator;

impl SqlGenerator for FirebirdGenerator {
    fn upper_function(&self) -> &str {
        "UPPER"
    }

    fn limit_offset(&self, limit: &str, offset: &str) -> String {
        format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit)
    }
}

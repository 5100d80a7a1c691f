use crate::transpiler::traits::SqlGenerator;

/// SQL Server Compact. Same syntax as SQL Server 2012 for what we emit.
pub struct SqlCeGenerator;

impl SqlGenerator for SqlCeGenerator {
    fn quote_identifier(&self, id: &str) -> String {
        format!("[{}]", id.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn upper_function(&self) -> &str {
        "UPPER"
    }

    fn string_concat(&self, parts: &[&str]) -> String {
        parts.join(" + ")
    }

    fn limit_offset(&self, limit: &str, offset: &str) -> String {
        format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit)
    }

    fn requires_order_for_offset(&self) -> bool {
        true
    }
}

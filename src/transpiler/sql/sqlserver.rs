use crate::transpiler::traits::SqlGenerator;

pub struct SqlServerGenerator;

impl SqlGenerator for SqlServerGenerator {
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

    // T-SQL: OFFSET n ROWS FETCH NEXT m ROWS ONLY, after an ORDER BY.
    fn limit_offset(&self, limit: &str, offset: &str) -> String {
        format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit)
    }

    fn requires_order_for_offset(&self) -> bool {
        true
    }
}

use crate::transpiler::traits::SqlGenerator;

/// IBM DB2. Uses every trait default: `UCASE`, `||`, `LIMIT ... OFFSET ...`.
pub struct Db2Generator;

impl SqlGenerator for Db2Generator {}

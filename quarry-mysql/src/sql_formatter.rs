use quarry_core::{
    FormatterSettings, Result, SqlFormatter,
    writer::Context,
};

/// Formatter producing MySQL: pagination is `LIMIT ?, ?`.
pub struct MySqlFormatter {
    settings: FormatterSettings,
}

impl MySqlFormatter {
    pub fn new(settings: FormatterSettings) -> Self {
        Self { settings }
    }
}

impl SqlFormatter for MySqlFormatter {
    fn as_dyn(&self) -> &dyn SqlFormatter {
        self
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<()> {
        self.write_keyword(context, out, "LIMIT ");
        self.write_pagination_argument(context, out, offset.unwrap_or(0) as i64)?;
        out.push_str(", ");
        self.write_pagination_argument(context, out, limit.map_or(i32::MAX as i64, |v| v as i64))
    }
}

use quarry_core::{
    FormatterSettings, Result, SqlFormatter,
    writer::Context,
};

/// Formatter producing PostgreSQL: numbered `$n` placeholders and `LIMIT ? OFFSET ?`.
pub struct PostgresFormatter {
    settings: FormatterSettings,
}

impl PostgresFormatter {
    pub fn new(settings: FormatterSettings) -> Self {
        Self { settings }
    }
}

impl SqlFormatter for PostgresFormatter {
    fn as_dyn(&self) -> &dyn SqlFormatter {
        self
    }

    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    fn write_placeholder(&self, _context: &mut Context, out: &mut String, position: usize) {
        out.push('$');
        out.push_str(itoa::Buffer::new().format(position));
    }

    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<()> {
        if let Some(limit) = limit {
            self.write_keyword(context, out, "LIMIT ");
            self.write_pagination_argument(context, out, limit as i64)?;
        }
        if let Some(offset) = offset {
            if limit.is_some() {
                out.push(' ');
            }
            self.write_keyword(context, out, "OFFSET ");
            self.write_pagination_argument(context, out, offset as i64)?;
        }
        Ok(())
    }
}

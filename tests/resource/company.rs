use quarry::{Column, Table, sql_types};
use time::Date;

pub struct Departments {
    pub table: Table,
    pub id: Column<i32>,
    pub name: Column<String>,
    pub location: Column<String>,
}

impl Departments {
    pub fn new() -> Self {
        Self::of(Table::new("t_department"))
    }

    pub fn aliased(&self, alias: &'static str) -> Self {
        Self::of(self.table.aliased(alias))
    }

    fn of(table: Table) -> Self {
        Self {
            id: table.column("id", sql_types::INT),
            name: table.column("name", sql_types::VARCHAR),
            location: table.column("location", sql_types::VARCHAR),
            table,
        }
    }
}

pub struct Employees {
    pub table: Table,
    pub id: Column<i32>,
    pub name: Column<String>,
    pub job: Column<String>,
    pub manager_id: Column<i32>,
    pub hire_date: Column<Date>,
    pub salary: Column<i64>,
    pub department_id: Column<i32>,
}

impl Employees {
    pub fn new() -> Self {
        Self::of(Table::new("t_employee"))
    }

    pub fn aliased(&self, alias: &'static str) -> Self {
        Self::of(self.table.aliased(alias))
    }

    fn of(table: Table) -> Self {
        Self {
            id: table.column("id", sql_types::INT),
            name: table.column("name", sql_types::VARCHAR),
            job: table.column("job", sql_types::VARCHAR),
            manager_id: table.column("manager_id", sql_types::INT),
            hire_date: table.column("hire_date", sql_types::DATE),
            salary: table.column("salary", sql_types::LONG),
            department_id: table.column("department_id", sql_types::INT),
            table,
        }
    }
}

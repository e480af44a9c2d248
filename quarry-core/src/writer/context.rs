use crate::{ArgumentBinding, TableReference};
use std::ops::{Deref, DerefMut};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlJoin,
    SqlPagination,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlSelectWhere,
    SqlUnion,
    SqlUpdate,
    SqlUpdateSet,
    SqlUpdateWhere,
}

/// State threaded through a single formatting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub fragment: Fragment,
    pub qualify_columns: bool,
    /// Tables visible to each enclosing statement, innermost last.
    pub scopes: Vec<Vec<TableReference>>,
    /// Nesting level of subqueries, drives the indentation when beautifying.
    pub depth: usize,
    /// Arguments collected so far, in placeholder order.
    pub arguments: Vec<ArgumentBinding>,
}

impl Context {
    pub fn new(fragment: Fragment, qualify_columns: bool) -> Self {
        Self {
            fragment,
            qualify_columns,
            scopes: Vec::new(),
            depth: 0,
            arguments: Vec::new(),
        }
    }

    /// Registers an argument and returns its 1-based placeholder number.
    pub fn push_argument(&mut self, argument: ArgumentBinding) -> usize {
        self.arguments.push(argument);
        self.arguments.len()
    }

    /// Enter a fragment, the previous one is restored when the returned guard is dropped.
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let mut updater = ContextUpdater::new(self);
        updater.context.fragment = fragment;
        updater
    }

    /// Enter a nested query one indentation level deeper.
    pub fn nested<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let mut updater = ContextUpdater::new(self);
        updater.context.fragment = fragment;
        updater.context.depth += 1;
        updater.context.qualify_columns = false;
        updater
    }

    /// Open the scope of a statement reading from `tables`, closed when the
    /// returned guard is dropped.
    pub fn enter_scope<'s>(
        &'s mut self,
        fragment: Fragment,
        tables: Vec<TableReference>,
    ) -> ContextUpdater<'s> {
        let mut updater = self.switch_fragment(fragment);
        updater.context.scopes.push(tables);
        updater
    }

    /// The enclosing table a column of `table` refers to when `table` is not
    /// visible in the innermost scope.
    pub fn outer_table(&self, table: &TableReference) -> Option<TableReference> {
        let (current, outer) = self.scopes.split_last()?;
        if current.contains(table) {
            return None;
        }
        outer
            .iter()
            .rev()
            .find_map(|scope| scope.iter().find(|v| *v == table))
            .cloned()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None, false)
    }
}

pub struct ContextUpdater<'a> {
    fragment: Fragment,
    qualify_columns: bool,
    scopes: usize,
    depth: usize,
    context: &'a mut Context,
}

impl<'a> ContextUpdater<'a> {
    fn new(context: &'a mut Context) -> Self {
        Self {
            fragment: context.fragment,
            qualify_columns: context.qualify_columns,
            scopes: context.scopes.len(),
            depth: context.depth,
            context,
        }
    }
}

impl<'a> Deref for ContextUpdater<'a> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<'a> DerefMut for ContextUpdater<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.context.fragment = self.fragment;
        self.context.qualify_columns = self.qualify_columns;
        self.context.scopes.truncate(self.scopes);
        self.context.depth = self.depth;
    }
}

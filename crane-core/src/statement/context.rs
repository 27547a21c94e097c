use crate::DbSetting;
use std::mem;

/// Statement section being written.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    Select,
    SelectFrom,
    SelectWhere,
    SelectOrderBy,
    SelectLimit,
    InsertInto,
    InsertIntoValues,
    InsertIntoOnConflict,
    Returning,
    UpdateSet,
    UpdateWhere,
    DeleteFrom,
    DeleteWhere,
    Truncate,
}

/// State threaded through the `write_*` methods of a [`crate::StatementBuilder`].
pub struct Context<'a> {
    pub fragment: Fragment,
    pub setting: &'a dyn DbSetting,
    /// Placeholder names in order of first appearance.
    pub parameters: Vec<String>,
}

impl<'a> Context<'a> {
    pub fn new(fragment: Fragment, setting: &'a dyn DbSetting) -> Self {
        Self {
            fragment,
            setting,
            parameters: Vec::new(),
        }
    }
    /// One based position of `name`, registered on first use.
    pub fn parameter_index(&mut self, name: &str) -> usize {
        match self.parameters.iter().position(|v| v == name) {
            Some(i) => i + 1,
            None => {
                self.parameters.push(name.to_string());
                self.parameters.len()
            }
        }
    }
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s, 'a> {
        ContextUpdater {
            current: Context {
                fragment,
                setting: self.setting,
                parameters: mem::take(&mut self.parameters),
            },
            previous: self,
        }
    }
}

pub struct ContextUpdater<'s, 'a> {
    pub current: Context<'a>,
    pub previous: &'s mut Context<'a>,
}

impl<'s, 'a> Drop for ContextUpdater<'s, 'a> {
    fn drop(&mut self) {
        self.previous.parameters = mem::take(&mut self.current.parameters);
    }
}

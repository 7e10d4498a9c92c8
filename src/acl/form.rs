//! Add/edit form state for a single ACL.

use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

use super::{acl_type_info, AclOption, AclRule, AclTypeInfo};

/// Which dialog a form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclMode {
    Add,
    Edit,
}

impl AclMode {
    pub fn key(self) -> &'static str {
        match self {
            AclMode::Add => "add",
            AclMode::Edit => "edit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(AclMode::Add),
            "edit" => Some(AclMode::Edit),
            _ => None,
        }
    }
}

/// Validation failures caught before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclFormError {
    #[error("the ACL needs a name")]
    MissingName,
    #[error("the ACL needs a type")]
    MissingType,
    #[error("the ACL needs at least one value")]
    NoValues,
    #[error("no ACL selected for editing")]
    MissingId,
}

/// One value input. Row ids stay stable while rows come and go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRow {
    pub row_id: u32,
    pub value: String,
}

/// Fields as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AclFormFields {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub acl_type: String,
    #[serde(default, rename = "values[]")]
    pub values: Vec<String>,
    #[serde(default, rename = "options[]")]
    pub options: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

/// A validated add or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclSubmission {
    pub mode: AclMode,
    pub id: Option<u64>,
    pub name: String,
    pub acl_type: String,
    pub values: Vec<String>,
    pub options: Vec<AclOption>,
    pub comment: String,
}

impl AclSubmission {
    /// Backend path receiving the form post.
    pub fn endpoint(&self) -> &'static str {
        match self.mode {
            AclMode::Add => "/admin/acls/add",
            AclMode::Edit => "/admin/acls/edit",
        }
    }

    /// Form-encoded fields, repeating `values[]` and `options[]`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(id) = self.id {
            fields.push(("id", id.to_string()));
        }
        fields.push(("name", self.name.clone()));
        fields.push(("type", self.acl_type.clone()));
        for value in &self.values {
            fields.push(("values[]", value.clone()));
        }
        for option in &self.options {
            fields.push(("options[]", option.flag().to_string()));
        }
        fields.push(("comment", self.comment.clone()));
        fields
    }
}

#[derive(Debug, Clone)]
pub struct AclForm {
    pub mode: AclMode,
    pub id: Option<u64>,
    pub name: String,
    pub acl_type: String,
    pub options: BTreeSet<AclOption>,
    pub comment: String,
    rows: Vec<ValueRow>,
    next_row_id: u32,
}

impl AclForm {
    fn empty(mode: AclMode) -> Self {
        Self {
            mode,
            id: None,
            name: String::new(),
            acl_type: String::new(),
            options: BTreeSet::new(),
            comment: String::new(),
            rows: Vec::new(),
            next_row_id: 0,
        }
    }

    /// Blank add form with one value input.
    pub fn new_add() -> Self {
        let mut form = Self::empty(AclMode::Add);
        form.add_value_row();
        form
    }

    /// Edit form prefilled from an existing rule.
    pub fn for_rule(rule: &AclRule) -> Self {
        let mut form = Self::empty(AclMode::Edit);
        form.id = Some(rule.id);
        form.name = rule.name.clone();
        form.acl_type = rule.acl_type.clone();
        form.options = rule.parsed_options().into_iter().collect();
        form.comment = rule.comment.clone().unwrap_or_default();
        form.set_values(rule.values.iter().cloned());
        form
    }

    pub fn rows(&self) -> &[ValueRow] {
        &self.rows
    }

    pub fn add_value_row(&mut self) -> u32 {
        self.next_row_id += 1;
        let row_id = self.next_row_id;
        self.rows.push(ValueRow {
            row_id,
            value: String::new(),
        });
        row_id
    }

    pub fn remove_value_row(&mut self, row_id: u32) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.row_id != row_id);
        self.rows.len() != before
    }

    /// Rebuild the value rows. An empty list leaves one blank input.
    fn set_values(&mut self, values: impl IntoIterator<Item = String>) {
        self.rows.clear();
        for value in values {
            let row_id = self.add_value_row();
            if let Some(row) = self.rows.iter_mut().find(|r| r.row_id == row_id) {
                row.value = value;
            }
        }
        if self.rows.is_empty() {
            self.add_value_row();
        }
    }

    /// Take over what the user typed. Existing row ids are kept when the
    /// number of posted values matches the rows on screen.
    pub fn apply_fields(&mut self, fields: AclFormFields) {
        self.name = fields.name;
        if self.mode == AclMode::Add {
            self.acl_type = fields.acl_type;
        }
        self.comment = fields.comment;
        self.options = fields.options.iter().filter_map(|o| AclOption::parse(o)).collect();

        if fields.values.len() == self.rows.len() {
            for (row, value) in self.rows.iter_mut().zip(fields.values) {
                row.value = value;
            }
        } else {
            self.set_values(fields.values);
        }
    }

    pub fn set_type(&mut self, tag: &str) {
        self.acl_type = tag.trim().to_string();
    }

    pub fn type_info(&self) -> Option<&'static AclTypeInfo> {
        acl_type_info(&self.acl_type)
    }

    pub fn has_option(&self, option: AclOption) -> bool {
        self.options.contains(&option)
    }

    pub fn to_submission(&self) -> Result<AclSubmission, AclFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AclFormError::MissingName);
        }
        let acl_type = self.acl_type.trim();
        if acl_type.is_empty() {
            return Err(AclFormError::MissingType);
        }
        let values: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.value.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return Err(AclFormError::NoValues);
        }
        if self.mode == AclMode::Edit && self.id.is_none() {
            return Err(AclFormError::MissingId);
        }

        Ok(AclSubmission {
            mode: self.mode,
            id: self.id,
            name: name.to_string(),
            acl_type: acl_type.to_string(),
            values,
            options: self.options.iter().copied().collect(),
            comment: self.comment.trim().to_string(),
        })
    }
}

//! Database catalog: the objects a database holds and the files backing
//! them, written as JSON to the database path itself.

use crate::{
    error::{Error, Result},
    index_column::IndexFlags,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const FIRST_OBJECT_ID: u32 = 256;
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Int32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Array,
    PatriciaTrie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectSpec {
    Table {
        id: u32,
        name: String,
        table_type: TableType,
        key_type: Option<ValueType>,
        path: Option<PathBuf>,
        size: u64,
    },
    Column {
        id: u32,
        name: String,
        table: String,
        value_type: ValueType,
        path: PathBuf,
    },
    Index {
        id: u32,
        name: String,
        table: String,
        source: String,
        flags: IndexFlags,
        path: PathBuf,
    },
}

impl ObjectSpec {
    pub fn id(&self) -> u32 {
        match self {
            ObjectSpec::Table { id, .. } | ObjectSpec::Column { id, .. } | ObjectSpec::Index { id, .. } => *id,
        }
    }

    /// Fully qualified name: `table` for tables, `table.column` otherwise.
    pub fn full_name(&self) -> String {
        match self {
            ObjectSpec::Table { name, .. } => name.clone(),
            ObjectSpec::Column { name, table, .. } | ObjectSpec::Index { name, table, .. } => {
                format!("{}.{}", table, name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    pub objects: Vec<ObjectSpec>,
    #[serde(skip)]
    next_id: u32,
}

/// `<db_path>.<id as 7 upper-case hex digits>`
pub fn object_path(db_path: &Path, id: u32) -> PathBuf {
    let mut path = db_path.as_os_str().to_owned();
    path.push(format!(".{:07X}", id));
    PathBuf::from(path)
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            version: CATALOG_VERSION,
            objects: Vec::new(),
            next_id: FIRST_OBJECT_ID,
        }
    }

    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn find(&self, full_name: &str) -> Option<&ObjectSpec> {
        self.objects.iter().find(|object| object.full_name() == full_name)
    }

    /// Registers `object`, refusing duplicate names.
    pub fn register(&mut self, object: ObjectSpec) -> Result<()> {
        if self.find(&object.full_name()).is_some() {
            return Err(Error::Schema(format!("{} already exists", object.full_name())));
        }
        self.objects.push(object);
        Ok(())
    }

    pub fn set_table_size(&mut self, table: &str, new_size: u64) {
        for object in &mut self.objects {
            if let ObjectSpec::Table { name, size, .. } = object {
                if name == table {
                    *size = new_size;
                }
            }
        }
    }

    pub fn save(&self, db_path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|source| Error::Catalog {
            path: db_path.to_path_buf(),
            source,
        })?;
        fs::write(db_path, serialized)?;
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

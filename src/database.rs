use crate::{
    cli::Args,
    engine::IndexEngine,
    error::Result,
    index_column::{IndexColumn, IndexFlags, Posting},
    lexicon::Lexicon,
    schema::{object_path, Catalog, ObjectSpec, TableType, ValueType},
    storage::reset_directory,
    table::{ArrayTable, RecordId},
};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DATA_TABLE: &str = "table";
pub const DATA_COLUMN: &str = "column";
pub const LEXICON: &str = "lexicon";
pub const INDEX_COLUMN: &str = "index";

/// Every record holds a single value, so each posting lands in the first
/// section at the first position.
const SECTION: u32 = 1;
const POSITION: u32 = 0;

/// A database holding the data table, its lexicon and the index column that
/// ties them together.
pub struct Database {
    path: PathBuf,
    catalog: Catalog,
    table: ArrayTable,
    lexicon: Lexicon,
    index: IndexColumn,
}

impl Database {
    /// Creates the database file at `path` and defines the schema. The parent
    /// directory must already exist.
    pub fn create(path: &Path, flags: IndexFlags) -> Result<Self> {
        let mut catalog = Catalog::new();
        catalog.save(path)?;

        let table_id = catalog.allocate_id();
        catalog.register(ObjectSpec::Table {
            id: table_id,
            name: DATA_TABLE.to_string(),
            table_type: TableType::Array,
            key_type: None,
            path: None,
            size: 0,
        })?;

        let column_id = catalog.allocate_id();
        let column_path = object_path(path, column_id);
        let table = ArrayTable::create(&column_path)?;
        catalog.register(ObjectSpec::Column {
            id: column_id,
            name: DATA_COLUMN.to_string(),
            table: DATA_TABLE.to_string(),
            value_type: ValueType::Int32,
            path: column_path,
        })?;

        let lexicon_id = catalog.allocate_id();
        let lexicon_path = object_path(path, lexicon_id);
        let lexicon = Lexicon::create(LEXICON, &lexicon_path)?;
        catalog.register(ObjectSpec::Table {
            id: lexicon_id,
            name: LEXICON.to_string(),
            table_type: TableType::PatriciaTrie,
            key_type: Some(ValueType::Int32),
            path: Some(lexicon_path),
            size: 0,
        })?;

        let index_id = catalog.allocate_id();
        let index_path = object_path(path, index_id);
        let index = IndexColumn::create(INDEX_COLUMN, flags, &index_path)?;
        catalog.register(ObjectSpec::Index {
            id: index_id,
            name: INDEX_COLUMN.to_string(),
            table: LEXICON.to_string(),
            source: format!("{}.{}", DATA_TABLE, DATA_COLUMN),
            flags,
            path: index_path,
        })?;

        catalog.save(path)?;
        info!(
            path = %path.display(),
            with_position = flags.with_position,
            with_section = flags.with_section,
            "created database"
        );

        Ok(Database {
            path: path.to_path_buf(),
            catalog,
            table,
            lexicon,
            index,
        })
    }

    #[cfg(test)]
    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[cfg(test)]
    pub(crate) fn table(&mut self) -> &mut ArrayTable {
        &mut self.table
    }

    #[cfg(test)]
    pub(crate) fn lexicon(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    #[cfg(test)]
    pub(crate) fn index(&mut self) -> &mut IndexColumn {
        &mut self.index
    }

    /// Adds a data record and indexes its value.
    pub fn add(&mut self, value: i32) -> Result<RecordId> {
        let record_id = self.table.add(value)?;
        let (term_id, _) = self.lexicon.add(value)?;
        self.index.add_posting(
            term_id,
            Posting {
                record_id,
                section: SECTION,
                position: POSITION,
            },
        )?;
        Ok(record_id)
    }

    /// Flushes every file and rewrites the catalog with current sizes.
    pub fn sync(&mut self) -> Result<()> {
        self.table.sync()?;
        self.lexicon.sync()?;
        self.index.sync()?;
        self.catalog.set_table_size(DATA_TABLE, self.table.size());
        self.catalog.set_table_size(LEXICON, self.lexicon.size());
        self.catalog.save(&self.path)
    }
}

/// Wipes `args.db_dir`, then creates the database at `DB_DIR/db` with the
/// requested index flags.
pub fn prepare_database(args: &Args) -> Result<Database> {
    reset_directory(&args.db_dir)?;
    <Database as IndexEngine>::create(&args.db_path(), args.flags)
}

impl IndexEngine for Database {
    fn create(db_path: &Path, flags: IndexFlags) -> Result<Self> {
        Database::create(db_path, flags)
    }

    fn insert(&mut self, value: i32) -> Result<()> {
        self.add(value).map(|_| ())
    }

    fn table_size(&self) -> u64 {
        self.table.size()
    }

    fn lexicon_size(&self) -> u64 {
        self.lexicon.size()
    }

    fn column_disk_usage(&self) -> u64 {
        self.index.disk_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_defines_schema() -> Result<()> {
        let dir = tempdir()?;
        let db_path = dir.path().join("db");
        let flags = IndexFlags { with_position: true, with_section: false };
        let db = Database::create(&db_path, flags)?;

        assert!(db_path.is_file());
        let catalog = db.catalog();
        assert_eq!(catalog.objects.len(), 4);
        assert!(matches!(
            catalog.find("table"),
            Some(ObjectSpec::Table { table_type: TableType::Array, .. })
        ));
        assert!(matches!(
            catalog.find("lexicon"),
            Some(ObjectSpec::Table { table_type: TableType::PatriciaTrie, key_type: Some(ValueType::Int32), .. })
        ));
        match catalog.find("lexicon.index") {
            Some(ObjectSpec::Index { source, flags: index_flags, path, .. }) => {
                assert_eq!(source, "table.column");
                assert_eq!(*index_flags, flags);
                assert!(path.is_file());
            }
            other => panic!("unexpected index spec: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_add_updates_table_lexicon_and_index() -> Result<()> {
        let dir = tempdir()?;
        let mut db = Database::create(&dir.path().join("db"), IndexFlags::default())?;
        for value in [0, 0, 1, 1, 2] {
            db.add(value)?;
        }

        assert_eq!(db.table_size(), 5);
        assert_eq!(db.lexicon_size(), 3);
        assert_eq!(db.table().get(3)?, Some(1));

        let term_id = db.lexicon().get(1).unwrap_or_default();
        let records: Vec<RecordId> = db.index().postings(term_id)?.iter().map(|p| p.record_id).collect();
        assert_eq!(records, vec![3, 4]);
        Ok(())
    }

    #[test]
    fn test_position_flag_controls_stored_position() -> Result<()> {
        let dir = tempdir()?;
        let flags = IndexFlags { with_position: false, with_section: true };
        let mut db = Database::create(&dir.path().join("db"), flags)?;
        db.add(9)?;

        let postings = db.index().postings(1)?;
        assert_eq!(postings, vec![Posting { record_id: 1, section: 1, position: 0 }]);
        assert!(!db.index().flags().with_position);
        assert!(db.index().flags().with_section);
        Ok(())
    }

    #[test]
    fn test_sync_records_sizes_in_catalog() -> Result<()> {
        let dir = tempdir()?;
        let db_path = dir.path().join("db");
        let mut db = Database::create(&db_path, IndexFlags::default())?;
        db.add(1)?;
        db.add(1)?;
        db.sync()?;

        let saved: Catalog = serde_json::from_str(&std::fs::read_to_string(&db_path)?)
            .map_err(|source| crate::error::Error::Catalog { path: db_path.clone(), source })?;
        assert!(matches!(saved.find("table"), Some(ObjectSpec::Table { size: 2, .. })));
        assert!(matches!(saved.find("lexicon"), Some(ObjectSpec::Table { size: 1, .. })));
        Ok(())
    }

    fn args_for(db_dir: &Path, with_position: &str, with_section: &str, n_postings: &str) -> Result<Args> {
        crate::cli::parse_args(vec![
            std::ffi::OsString::from("measure"),
            db_dir.as_os_str().to_owned(),
            with_position.into(),
            with_section.into(),
            n_postings.into(),
        ])
    }

    #[test]
    fn test_prepare_database_wipes_existing_content() -> Result<()> {
        let dir = tempdir()?;
        let db_dir = dir.path().join("t");
        std::fs::create_dir_all(db_dir.join("old"))?;
        std::fs::write(db_dir.join("old").join("stale"), b"x")?;
        std::fs::write(db_dir.join("db"), b"not a catalog")?;

        let args = args_for(&db_dir, "true", "false", "2")?;
        let db = prepare_database(&args)?;
        assert!(!db_dir.join("old").exists());
        assert!(db_dir.join("db").is_file());
        assert_eq!(db.table_size(), 0);
        assert!(matches!(
            db.catalog().find("lexicon.index"),
            Some(ObjectSpec::Index { flags: IndexFlags { with_position: true, with_section: false }, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_prepare_database_replaces_regular_file() -> Result<()> {
        let dir = tempdir()?;
        let db_dir = dir.path().join("t");
        std::fs::write(&db_dir, b"a file where the directory goes")?;

        let args = args_for(&db_dir, "false", "true", "1")?;
        prepare_database(&args)?;
        assert!(db_dir.is_dir());
        assert!(db_dir.join("db").is_file());
        Ok(())
    }

    #[test]
    fn test_prepared_database_measures_two_postings_per_term() -> Result<()> {
        use crate::{
            generator::ValueGenerator,
            measure::{measure_disk_usage, MeasureConfig},
        };

        let dir = tempdir()?;
        let args = args_for(&dir.path().join("t"), "true", "false", "2")?;
        let mut db = prepare_database(&args)?;
        let mut output = Vec::new();
        let config = MeasureConfig { max_records: 1000 };
        let summary = measure_disk_usage(&mut db, ValueGenerator::new(args.n_postings_per_term), &mut output, &config)?;

        let last = summary.last_row.map_or(0, |row| row.n_records);
        assert!(last > 1000);
        assert_eq!(db.table_size(), last);
        for record_id in 1..=6 {
            assert_eq!(db.table().get(record_id)?, Some((record_id as i32 - 1) / 2));
        }
        let postings = db.index().postings(1)?;
        assert_eq!(
            postings,
            vec![
                Posting { record_id: 1, section: 0, position: 0 },
                Posting { record_id: 2, section: 0, position: 0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_create_fails_without_directory() {
        let dir = tempdir().unwrap();
        let result = Database::create(&dir.path().join("missing").join("db"), IndexFlags::default());
        assert!(result.is_err());
    }
}

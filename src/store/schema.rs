// store/schema.rs - Table metadata for the backing store
//
// The hosted database owns the real DDL. This mirrors the parts the API
// depends on: primary keys and the foreign keys used for nested selects.

/// A foreign key column referencing the `id` of another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub foreign_keys: &'static [ForeignKey],
}

impl Table {
    pub fn primary_key_constraint(&self) -> String {
        format!("{}_pkey", self.name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

/// Postgres-style name of the constraint backing `table.column`.
pub fn foreign_key_constraint(table: &str, column: &str) -> String {
    format!("{}_{}_fkey", table, column)
}

pub const USERS: &str = "users";
pub const PROBLEMS: &str = "problems";
pub const SOLUTIONS: &str = "solutions";
pub const DISCUSSIONS: &str = "discussions";
pub const CONTACTS: &str = "contacts";

pub static TABLES: &[Table] = &[
    Table {
        name: USERS,
        foreign_keys: &[],
    },
    Table {
        name: PROBLEMS,
        foreign_keys: &[ForeignKey { column: "posted_by", references: USERS }],
    },
    Table {
        name: SOLUTIONS,
        foreign_keys: &[
            ForeignKey { column: "problem_id", references: PROBLEMS },
            ForeignKey { column: "builder_id", references: USERS },
        ],
    },
    Table {
        name: DISCUSSIONS,
        foreign_keys: &[
            ForeignKey { column: "problem_id", references: PROBLEMS },
            ForeignKey { column: "user_id", references: USERS },
            ForeignKey { column: "parent_id", references: DISCUSSIONS },
        ],
    },
    Table {
        name: CONTACTS,
        foreign_keys: &[],
    },
];

pub fn table(name: &str) -> Option<&'static Table> {
    TABLES.iter().find(|t| t.name == name)
}

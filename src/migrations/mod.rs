mod m0001_roster_tables;
mod m0002_lookup_indexes;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_roster_tables::migration());
    reg.register(m0002_lookup_indexes::migration());
    reg
}

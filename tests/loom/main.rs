#![cfg(loom)]

mod object_table;

pub mod fix_fingers;
pub mod join;
pub mod listener;
pub mod shell;
pub mod stabilize;
pub mod successors;
pub mod web;

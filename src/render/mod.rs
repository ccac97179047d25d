//! Layout of parsed HTML into a rendered snapshot.

pub mod layout;

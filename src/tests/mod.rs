// Boot-level tests across store, migrator and serial port


#[cfg(test)]
mod store_tests;

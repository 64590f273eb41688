fn main() {
    // Lets the cdylib leave libpython symbols unresolved on every platform.
    pyo3_build_config::add_extension_module_link_args();
}

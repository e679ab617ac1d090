/// Namespace of the Visual Studio 2010 extension manifest schema.
pub const VSIX_NAMESPACE: &str = "http://schemas.microsoft.com/developer/vsx-schema/2010";

/// What to patch and what to write into it.
///
/// The defaults target Atmel Studio, which identifies itself to the extension
/// manager as an `IsolatedShell` product named `AtmelStudio`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    /// Path of the manifest inside the archive.
    pub manifest_entry: String,
    /// Namespace the `References` and `SupportedProducts` elements live in.
    pub namespace: String,
    /// Tag of the supported-product record to append.
    pub product_kind: String,
    /// Text content of the supported-product record.
    pub product_name: String,
    /// Inserted between the input stem and the version in the output filename.
    pub output_tag: String,
    /// Remove a leftover staging directory instead of failing.
    pub force: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        PatchOptions {
            manifest_entry: "extension.vsixmanifest".into(),
            namespace: VSIX_NAMESPACE.into(),
            product_kind: "IsolatedShell".into(),
            product_name: "AtmelStudio".into(),
            output_tag: "AtmelStudio".into(),
            force: false,
        }
    }
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest_entry(mut self, entry: impl Into<String>) -> Self {
        self.manifest_entry = entry.into();
        self
    }

    pub fn product_kind(mut self, kind: impl Into<String>) -> Self {
        self.product_kind = kind.into();
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

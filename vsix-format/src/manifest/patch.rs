use super::{Document, Element, ManifestError};

/// A `<SupportedProducts>` entry, e.g.
/// `<IsolatedShell Version="6.1">AtmelStudio</IsolatedShell>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedProduct<'a> {
    pub kind: &'a str,
    pub version: &'a str,
    pub name: &'a str,
}

const REFERENCES: &str = "References";
const SUPPORTED_PRODUCTS: &str = "SupportedProducts";

fn require(doc: &Document, namespace: &str, name: &str) -> Result<(), ManifestError> {
    match doc.find(namespace, name) {
        Some(_) => Ok(()),
        None => Err(missing(namespace, name)),
    }
}

fn missing(namespace: &str, name: &str) -> ManifestError {
    ManifestError::MissingElement {
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

/// Empties the `References` element. Returns how many child elements were
/// removed.
pub fn remove_references(doc: &mut Document, namespace: &str) -> Result<usize, ManifestError> {
    let references = doc
        .find_mut(namespace, REFERENCES)
        .ok_or_else(|| missing(namespace, REFERENCES))?;
    let removed = references.children().count();
    references.clear();
    tracing::debug!(removed, "cleared references");
    Ok(removed)
}

/// Appends `product` to `SupportedProducts`. Existing entries, including
/// identical ones, are left alone.
pub fn add_supported_product(
    doc: &mut Document,
    namespace: &str,
    product: &SupportedProduct<'_>,
) -> Result<(), ManifestError> {
    let products = doc
        .find_mut(namespace, SUPPORTED_PRODUCTS)
        .ok_or_else(|| missing(namespace, SUPPORTED_PRODUCTS))?;

    // Reuse the parent's prefix so the new name resolves to the same namespace.
    let name = match products.prefix() {
        Some(prefix) => format!("{}:{}", prefix, product.kind),
        None => product.kind.to_string(),
    };

    let mut element = Element::new(name, products.namespace());
    element.set_attribute("Version", product.version);
    element.set_text(product.name);

    tracing::debug!(
        kind = product.kind,
        version = product.version,
        name = product.name,
        "adding supported product"
    );
    products.push_element(element);
    Ok(())
}

/// Retargets a manifest: clears `References`, then appends `product` to
/// `SupportedProducts`. Both elements are looked up before anything changes,
/// so a manifest missing either one is returned untouched.
pub fn patch(
    doc: &mut Document,
    namespace: &str,
    product: &SupportedProduct<'_>,
) -> Result<usize, ManifestError> {
    require(doc, namespace, REFERENCES)?;
    require(doc, namespace, SUPPORTED_PRODUCTS)?;

    let removed = remove_references(doc, namespace)?;
    add_supported_product(doc, namespace, product)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VSIX_NAMESPACE;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Vsix Version="1.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2010">
  <Identifier Id="Sample.Extension">
    <Name>Sample</Name>
    <SupportedProducts>
      <VisualStudio Version="10.0">
        <Edition>Pro</Edition>
      </VisualStudio>
    </SupportedProducts>
  </Identifier>
  <References>
    <Reference Id="A" MinVersion="1.0"/>
    <Reference Id="B"/>
  </References>
</Vsix>
"#;

    const ATMEL: SupportedProduct<'static> = SupportedProduct {
        kind: "IsolatedShell",
        version: "6.1",
        name: "AtmelStudio",
    };

    fn parse(xml: &str) -> Document {
        Document::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn patch_clears_references_and_adds_product() {
        let mut doc = parse(MANIFEST);
        let removed = patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap();
        assert_eq!(removed, 2);

        let references = doc.find(VSIX_NAMESPACE, "References").unwrap();
        assert_eq!(references.nodes().len(), 0);

        let products = doc.find(VSIX_NAMESPACE, "SupportedProducts").unwrap();
        let added: Vec<_> = products.children().collect();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].name(), "VisualStudio");

        let shell = added[1];
        assert_eq!(shell.name(), "IsolatedShell");
        assert_eq!(shell.namespace(), Some(VSIX_NAMESPACE));
        assert_eq!(shell.attribute("Version").unwrap().value().unwrap(), "6.1");
        assert_eq!(shell.text().unwrap(), "AtmelStudio");
    }

    #[test]
    fn patched_manifest_serializes_in_default_namespace() {
        let mut doc = parse(MANIFEST);
        patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap();
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();

        assert!(out.contains(
            r#"<IsolatedShell Version="6.1">AtmelStudio</IsolatedShell></SupportedProducts>"#
        ));
        assert!(out.contains("<References/>"));
        assert!(!out.contains("Reference Id"));
        assert!(out.starts_with(
            r#"<?xml version="1.0" encoding="utf-8"?>
<Vsix Version="1.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2010">"#
        ));

        let reparsed = parse(&out);
        let shell = reparsed.find(VSIX_NAMESPACE, "IsolatedShell").unwrap();
        assert_eq!(shell.text().unwrap(), "AtmelStudio");
    }

    #[test]
    fn patching_twice_appends_twice() {
        let mut doc = parse(MANIFEST);
        patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap();
        let removed = patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap();
        assert_eq!(removed, 0);

        let products = doc.find(VSIX_NAMESPACE, "SupportedProducts").unwrap();
        let shells = products
            .children()
            .filter(|child| child.local_name() == "IsolatedShell")
            .count();
        assert_eq!(shells, 2);
    }

    #[test]
    fn prefixed_manifest_gets_prefixed_product() {
        let xml = format!(
            r#"<v:Vsix xmlns:v="{VSIX_NAMESPACE}"><v:SupportedProducts/><v:References><v:Reference/></v:References></v:Vsix>"#
        );
        let mut doc = parse(&xml);
        patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap();

        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(out.contains(
            r#"<v:SupportedProducts><v:IsolatedShell Version="6.1">AtmelStudio</v:IsolatedShell></v:SupportedProducts>"#
        ));

        let reparsed = parse(&out);
        assert!(reparsed.find(VSIX_NAMESPACE, "IsolatedShell").is_some());
    }

    #[test]
    fn missing_supported_products_leaves_document_untouched() {
        let xml = format!(
            r#"<Vsix xmlns="{VSIX_NAMESPACE}"><References><Reference/></References></Vsix>"#
        );
        let mut doc = parse(&xml);
        let before = doc.clone();

        let err = patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingElement { ref name, .. } if name == "SupportedProducts"
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn missing_references_is_an_error() {
        let xml = format!(r#"<Vsix xmlns="{VSIX_NAMESPACE}"><SupportedProducts/></Vsix>"#);
        let mut doc = parse(&xml);

        let err = patch(&mut doc, VSIX_NAMESPACE, &ATMEL).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingElement { ref name, .. } if name == "References"
        ));
    }

    #[test]
    fn elements_outside_the_namespace_are_ignored() {
        let xml = format!(
            r#"<Vsix xmlns="{VSIX_NAMESPACE}"><x:References xmlns:x="urn:other"><x:Keep/></x:References><SupportedProducts/></Vsix>"#
        );
        let mut doc = parse(&xml);
        assert!(patch(&mut doc, VSIX_NAMESPACE, &ATMEL).is_err());
    }
}

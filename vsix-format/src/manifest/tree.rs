use std::borrow::Cow;
use std::path::Path;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::{NsReader, Writer};

use super::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, kept escaped exactly as it appeared in the source.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Escaped value as written between the quotes.
    pub value: String,
}

impl Attribute {
    pub fn value(&self) -> Result<Cow<'_, str>, ManifestError> {
        unescape(&self.value).map_err(ManifestError::Escape)
    }

    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// An XML element along with the namespace its name resolved to when parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element named `name` (qualified, as it will be written) that
    /// belongs to `namespace`. The caller is responsible for `name` resolving
    /// to `namespace` where the element is inserted.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Element {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name() == local_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Sets `name` to `value`, escaping it. An existing attribute keeps its
    /// position.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let value = escape(value).into_owned();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping text, comments and the rest.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Unescaped text and CDATA directly inside this element.
    pub fn text(&self) -> Result<String, ManifestError> {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(raw) => out.push_str(&unescape(raw).map_err(ManifestError::Escape)?),
                Node::CData(raw) => out.push_str(raw),
                _ => {}
            }
        }
        Ok(out)
    }

    /// Replaces the direct text content with `text`, placed before any child
    /// elements.
    pub fn set_text(&mut self, text: &str) {
        self.children
            .retain(|node| !matches!(node, Node::Text(_) | Node::CData(_)));
        if !text.is_empty() {
            self.children
                .insert(0, Node::Text(escape(text).into_owned()));
        }
    }

    /// Drops every child node and every attribute except namespace
    /// declarations, which the element's own name may depend on.
    pub fn clear(&mut self) {
        self.children.clear();
        self.attributes.retain(Attribute::is_namespace_declaration);
    }

    /// First descendant (depth first, document order) named `local_name` in
    /// `namespace`.
    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.children().find_map(|child| {
            if child.is(namespace, local_name) {
                Some(child)
            } else {
                child.find(namespace, local_name)
            }
        })
    }

    pub fn find_mut(&mut self, namespace: &str, local_name: &str) -> Option<&mut Element> {
        for node in self.children.iter_mut() {
            if let Node::Element(child) = node {
                if child.is(namespace, local_name) {
                    return Some(child);
                }
                if let Some(found) = child.find_mut(namespace, local_name) {
                    return Some(found);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    fn from_event(decl: &BytesDecl<'_>) -> Result<Self, ManifestError> {
        fn syntax(source: impl Into<quick_xml::Error>) -> ManifestError {
            ManifestError::Syntax {
                source: source.into(),
                position: 0,
            }
        }

        let version = utf8(&decl.version().map_err(syntax)?)?.to_string();
        let encoding = match decl.encoding() {
            Some(encoding) => Some(utf8(&encoding.map_err(syntax)?)?.to_string()),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(standalone) => Some(utf8(&standalone.map_err(syntax)?)?.to_string()),
            None => None,
        };
        Ok(Declaration {
            version,
            encoding,
            standalone,
        })
    }

    // Output is always UTF-8, so any other declared encoding is replaced.
    fn output_encoding(&self) -> Option<&str> {
        self.encoding.as_deref().map(|encoding| {
            if encoding.eq_ignore_ascii_case("utf-8") {
                encoding
            } else {
                "utf-8"
            }
        })
    }
}

/// A parsed manifest. Untouched content serializes back byte for byte, except
/// that childless elements are always written self-closing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let source = std::str::from_utf8(bytes).map_err(ManifestError::NotUtf8)?;
        let mut reader = NsReader::from_str(source);
        let mut builder = Builder::default();

        loop {
            let position = reader.buffer_position() as u64;
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|source| ManifestError::Syntax { source, position })?;

            match event {
                Event::Decl(decl) => builder.declaration(Declaration::from_event(&decl)?)?,
                Event::Start(start) => {
                    let element = element(&start, resolved, position)?;
                    builder.open.push(element);
                }
                Event::Empty(start) => {
                    let element = element(&start, resolved, position)?;
                    builder.attach(Node::Element(element))?;
                }
                Event::End(_) => {
                    let element = builder
                        .open
                        .pop()
                        .ok_or(ManifestError::Malformed("closing tag without opening tag"))?;
                    builder.attach(Node::Element(element))?;
                }
                Event::Text(text) => builder.attach(Node::Text(utf8(&text)?.to_string()))?,
                Event::CData(cdata) => builder.attach(Node::CData(utf8(&cdata)?.to_string()))?,
                Event::Comment(comment) => {
                    builder.attach(Node::Comment(utf8(&comment)?.to_string()))?
                }
                Event::PI(pi) => {
                    builder.attach(Node::ProcessingInstruction(utf8(&pi)?.to_string()))?
                }
                Event::DocType(doctype) => {
                    builder.attach(Node::DocType(utf8(&doctype)?.to_string()))?
                }
                Event::Eof => break,
            }
        }

        builder.finish()
    }

    pub fn read_from(path: &Path) -> Result<Self, ManifestError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ManifestError::ReadFailed(e, path.to_path_buf()))?;
        Self::parse(&bytes)
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// First element anywhere in the document, root included, named
    /// `local_name` in `namespace`.
    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        if self.root.is(namespace, local_name) {
            return Some(&self.root);
        }
        self.root.find(namespace, local_name)
    }

    pub fn find_mut(&mut self, namespace: &str, local_name: &str) -> Option<&mut Element> {
        if self.root.is(namespace, local_name) {
            return Some(&mut self.root);
        }
        self.root.find_mut(namespace, local_name)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            emit(
                &mut writer,
                Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.output_encoding(),
                    decl.standalone.as_deref(),
                )),
            )?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        Ok(writer.into_inner())
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| ManifestError::WriteFailed(e, path.to_path_buf()))
    }
}

#[derive(Default)]
struct Builder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    open: Vec<Element>,
}

impl Builder {
    fn declaration(&mut self, declaration: Declaration) -> Result<(), ManifestError> {
        if self.declaration.is_some() || self.root.is_some() || !self.prolog.is_empty() {
            return Err(ManifestError::Malformed("misplaced XML declaration"));
        }
        self.declaration = Some(declaration);
        Ok(())
    }

    fn attach(&mut self, node: Node) -> Result<(), ManifestError> {
        if let Some(parent) = self.open.last_mut() {
            parent.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(ManifestError::Malformed("more than one root element"));
                }
                self.root = Some(element);
            }
            Node::Text(ref raw) if !raw.trim().is_empty() => {
                return Err(ManifestError::Malformed("text outside the root element"));
            }
            Node::CData(_) => {
                return Err(ManifestError::Malformed("CDATA outside the root element"));
            }
            Node::DocType(_) if self.root.is_some() => {
                return Err(ManifestError::Malformed("DOCTYPE after the root element"));
            }
            node => {
                if self.root.is_some() {
                    self.epilog.push(node);
                } else {
                    self.prolog.push(node);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, ManifestError> {
        if !self.open.is_empty() {
            return Err(ManifestError::Malformed("unclosed element"));
        }
        let root = self
            .root
            .ok_or(ManifestError::Malformed("no root element"))?;
        Ok(Document {
            declaration: self.declaration,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

/// Builds an element from its start tag and the namespace the reader resolved
/// its name to.
fn element(
    start: &BytesStart<'_>,
    resolved: ResolveResult<'_>,
    position: u64,
) -> Result<Element, ManifestError> {
    let namespace = match resolved {
        ResolveResult::Bound(namespace) => Some(utf8(namespace.as_ref())?.to_string()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(ManifestError::UnboundPrefix(
                String::from_utf8_lossy(&prefix).into_owned(),
            ));
        }
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ManifestError::Syntax {
            source: e.into(),
            position,
        })?;
        attributes.push(Attribute {
            name: utf8(attr.key.as_ref())?.to_string(),
            // Values are rewritten inside double quotes.
            value: utf8(&attr.value)?.replace('"', "&quot;"),
        });
    }

    Ok(Element {
        name: utf8(start.name().as_ref())?.to_string(),
        namespace,
        attributes,
        children: Vec::new(),
    })
}

fn utf8(bytes: &[u8]) -> Result<&str, ManifestError> {
    std::str::from_utf8(bytes).map_err(ManifestError::NotUtf8)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ManifestError> {
    writer
        .write_event(event)
        .map_err(|e| ManifestError::Serialize(std::io::Error::other(e)))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), ManifestError> {
    match node {
        Node::Element(element) => write_element(writer, element),
        Node::Text(raw) => emit(writer, Event::Text(BytesText::from_escaped(raw.as_str()))),
        Node::CData(raw) => emit(writer, Event::CData(BytesCData::new(raw.as_str()))),
        Node::Comment(raw) => emit(writer, Event::Comment(BytesText::from_escaped(raw.as_str()))),
        Node::ProcessingInstruction(raw) => emit(writer, Event::PI(BytesPI::new(raw.as_str()))),
        Node::DocType(raw) => emit(writer, Event::DocType(BytesText::from_escaped(raw.as_str()))),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), ManifestError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute(XmlAttribute {
            key: QName(attr.name.as_bytes()),
            value: Cow::Borrowed(attr.value.as_bytes()),
        });
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

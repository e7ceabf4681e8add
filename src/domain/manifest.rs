//! Parser for the XML signature manifest (`S63_SIGNATURES.XML`).
//!
//! The manifest describes data server certificates and per-file signatures
//! for everything in the exchange set that is not covered by per-cell
//! signature files. For each data server the four-block certificate text is
//! rebuilt exactly as the scheme administrator signed it: the endorsement
//! covers the textual representation of the parameters, not their decoded
//! binary value.

use roxmltree::{Document, Node};

use crate::domain::crypto::{DsaPublicKey, DsaSignature};
use crate::domain::sigrecord::{decode_hex_run, CERT_HEADINGS};
use crate::infra::error::{CheckError, CheckResult};

/// Namespace of the manifest document.
pub const NAMESPACE: &str = "http://www.iho.int/s63/1.1.1";

/// A data server record: certificate parameters, public key and the SA
/// endorsement over their textual form.
#[derive(Debug, Clone)]
pub struct DataServerRecord {
    id: String,
    /// `None` when the parameters decoded but were out of range.
    key: Option<DsaPublicKey>,
    certificate_signature: DsaSignature,
    certificate_text: Vec<u8>,
}

/// A per-file signature entry referencing a data server by ID.
#[derive(Debug, Clone)]
pub struct FileSignatureRecord {
    data_server_id: String,
    file_location: String,
    file_name: String,
    signature: DsaSignature,
}

/// A parsed signature manifest.
#[derive(Debug)]
pub struct SignatureManifest {
    data_servers: Vec<DataServerRecord>,
    file_signatures: Vec<FileSignatureRecord>,
}

impl SignatureManifest {
    /// Parse a manifest from raw XML bytes.
    pub fn parse(data: &[u8]) -> CheckResult<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| CheckError::Manifest("manifest is not UTF-8 text".to_string()))?;
        let doc = Document::parse(text)?;

        let root = doc.root_element();
        if root.tag_name().name() != "digitalSignatures"
            || root.tag_name().namespace() != Some(NAMESPACE)
        {
            return Err(CheckError::Manifest(
                "root element is not digitalSignatures".to_string(),
            ));
        }

        let mut data_servers = Vec::new();
        for servers in children_named(root, "dataServers") {
            for server in children_named(servers, "dataServer") {
                data_servers.push(DataServerRecord::from_node(server)?);
            }
        }

        let mut file_signatures = Vec::new();
        for signatures in children_named(root, "fileSignatures") {
            for signature in children_named(signatures, "fileSignature") {
                file_signatures.push(FileSignatureRecord::from_node(signature)?);
            }
        }

        Ok(Self {
            data_servers,
            file_signatures,
        })
    }

    #[must_use]
    pub fn data_servers(&self) -> &[DataServerRecord] {
        &self.data_servers
    }

    #[must_use]
    pub fn file_signatures(&self) -> &[FileSignatureRecord] {
        &self.file_signatures
    }

    /// Look up a data server record by ID.
    #[must_use]
    pub fn data_server(&self, id: &str) -> Option<&DataServerRecord> {
        self.data_servers.iter().find(|server| server.id == id)
    }
}

impl DataServerRecord {
    fn from_node(node: Node<'_, '_>) -> CheckResult<Self> {
        let id = node
            .attribute("dataServerID")
            .ok_or_else(|| CheckError::Manifest("dataServer without dataServerID".to_string()))?
            .to_string();

        let parameters = child_named(node, "Parameters")?;
        let parameter_p = text_of(child_named(parameters, "P")?)?;
        let parameter_q = text_of(child_named(parameters, "Q")?)?;
        let parameter_g = text_of(child_named(parameters, "G")?)?;
        let public_key_y = text_of(child_named(child_named(node, "PublicKey")?, "Y")?)?;

        let certificate = child_named(node, "dataserverCertificate")?;
        let cert_r = decode_hex_run(&text_of(child_named(certificate, "R")?)?)?;
        let cert_s = decode_hex_run(&text_of(child_named(certificate, "S")?)?)?;

        // The SA signed the parameters formatted as the four labelled
        // blocks of a signature record, each value followed by a period
        // and CRLF.
        let mut text = String::new();
        for (heading, value) in CERT_HEADINGS
            .iter()
            .zip([&parameter_p, &parameter_q, &parameter_g, &public_key_y])
        {
            text.push_str(heading);
            text.push_str("\r\n");
            text.push_str(value);
            text.push_str(".\r\n");
        }

        let key = DsaPublicKey::from_raw(
            &decode_hex_run(&parameter_p)?,
            &decode_hex_run(&parameter_q)?,
            &decode_hex_run(&parameter_g)?,
            &decode_hex_run(&public_key_y)?,
        )
        .ok();

        Ok(Self {
            id,
            key,
            certificate_signature: DsaSignature::from_raw(&cert_r, &cert_s),
            certificate_text: text.into_bytes(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The data server public key, if its parameters were in range.
    pub fn key(&self) -> CheckResult<&DsaPublicKey> {
        self.key.as_ref().ok_or_else(|| {
            CheckError::Crypto(format!(
                "data server {} carries an unusable public key",
                self.id
            ))
        })
    }

    /// The SA endorsement over the certificate text.
    #[must_use]
    pub fn certificate_signature(&self) -> &DsaSignature {
        &self.certificate_signature
    }

    /// The exact bytes the SA endorsement covers.
    #[must_use]
    pub fn certificate_text(&self) -> &[u8] {
        &self.certificate_text
    }
}

impl FileSignatureRecord {
    fn from_node(node: Node<'_, '_>) -> CheckResult<Self> {
        let data_server_id = node
            .attribute("dataServerID")
            .ok_or_else(|| CheckError::Manifest("fileSignature without dataServerID".to_string()))?
            .to_string();

        let file_location = text_of(child_named(node, "fileLocation")?)?;
        let file_name = text_of(child_named(node, "fileName")?)?;

        let signature = child_named(node, "Signature")?;
        let r = decode_hex_run(&text_of(child_named(signature, "R")?)?)?;
        let s = decode_hex_run(&text_of(child_named(signature, "S")?)?)?;

        Ok(Self {
            data_server_id,
            file_location,
            file_name,
            signature: DsaSignature::from_raw(&r, &s),
        })
    }

    #[must_use]
    pub fn data_server_id(&self) -> &str {
        &self.data_server_id
    }

    /// Entry path of the signed file relative to the container root.
    #[must_use]
    pub fn entry_path(&self) -> String {
        let location = self
            .file_location
            .replace('\\', "/")
            .trim_matches('/')
            .to_string();
        if location.is_empty() || location == "." {
            self.file_name.clone()
        } else {
            format!("{location}/{}", self.file_name)
        }
    }

    #[must_use]
    pub fn signature(&self) -> &DsaSignature {
        &self.signature
    }
}

fn children_named<'a>(
    node: Node<'a, 'a>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'a>> {
    node.children()
        .filter(move |child| child.is_element() && has_name(*child, name))
}

fn child_named<'a>(node: Node<'a, 'a>, name: &'static str) -> CheckResult<Node<'a, 'a>> {
    children_named(node, name)
        .next()
        .ok_or_else(|| CheckError::Manifest(format!("missing element {name}")))
}

fn has_name(node: Node<'_, '_>, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(NAMESPACE)
}

fn text_of(node: Node<'_, '_>) -> CheckResult<String> {
    Ok(node.text().unwrap_or_default().trim().to_string())
}

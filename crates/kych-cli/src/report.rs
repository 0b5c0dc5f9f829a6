//! Labelled-field report printer.

use chrono::NaiveDateTime;
use kych::Dump;
use kych_types::{FourCc, SecretBytes};

/// Prints every record in the dump as labelled fields, then the table
/// notices.
pub fn print(dump: &Dump) {
    for record in &dump.generic_passwords {
        println!("[+] Generic Password Record");
        field_time("Created", record.created);
        field_time("Modified", record.modified);
        field_bytes("Description", &record.description);
        field_fourcc("Creator", record.creator);
        field_fourcc("Type", record.type_code);
        field_bytes("Print Name", &record.print_name);
        field_bytes("Alias", &record.alias);
        field_bytes("Account", &record.account);
        field_bytes("Service", &record.service);
        field_secret("Password", record.password.as_ref());
        println!();
    }

    for record in &dump.internet_passwords {
        println!("[+] Internet Password Record");
        field_time("Created", record.created);
        field_time("Modified", record.modified);
        field_bytes("Description", &record.description);
        field_bytes("Comment", &record.comment);
        field_fourcc("Creator", record.creator);
        field_fourcc("Type", record.type_code);
        field_bytes("Print Name", &record.print_name);
        field_bytes("Alias", &record.alias);
        field_bytes("Protected", &record.protected);
        field_bytes("Account", &record.account);
        field_bytes("Security Domain", &record.security_domain);
        field_bytes("Server", &record.server);
        field_fourcc("Protocol", record.protocol);
        field_bytes("Auth Type", &record.auth_type);
        field("Port", &record.port.to_string());
        field_bytes("Path", &record.path);
        field_secret("Password", record.password.as_ref());
        println!();
    }

    for record in &dump.appleshare_passwords {
        println!("[+] AppleShare Password Record");
        field_time("Created", record.created);
        field_time("Modified", record.modified);
        field_bytes("Description", &record.description);
        field_bytes("Comment", &record.comment);
        field_fourcc("Creator", record.creator);
        field_fourcc("Type", record.type_code);
        field_bytes("Print Name", &record.print_name);
        field_bytes("Alias", &record.alias);
        field_bytes("Protected", &record.protected);
        field_bytes("Account", &record.account);
        field_bytes("Volume", &record.volume);
        field_bytes("Server", &record.server);
        field_fourcc("Protocol", record.protocol);
        field_bytes("Address", &record.address);
        field_bytes("Signature", &record.signature);
        field_secret("Password", record.password.as_ref());
        println!();
    }

    for record in &dump.certificates {
        println!("[+] Certificate Record");
        field("Cert Type", &record.cert_type.to_string());
        field("Cert Encoding", &record.cert_encoding.to_string());
        field_bytes("Print Name", &record.print_name);
        field_bytes("Alias", &record.alias);
        field("Certificate", &format!("{} bytes (DER)", record.certificate.len()));
        println!();
    }

    for record in &dump.public_keys {
        println!("[+] Public Key Record");
        print_key_fields(record);
        field("Key Data", &format!("{} bytes", record.key_blob.len()));
        println!();
    }

    for record in &dump.private_keys {
        println!("[+] Private Key Record");
        print_key_fields(record);
        field_secret("Key Label", record.unwrapped_label.as_ref());
        match &record.key_material {
            Some(material) => field("Key Material", &format!("{} bytes (decrypted)", material.len())),
            None => field("Key Material", "<not recovered>"),
        }
        println!();
    }

    for notice in &dump.notices {
        println!("[!] {notice}");
    }
}

fn print_key_fields(record: &kych_types::KeyRecord) {
    field_bytes("Print Name", &record.print_name);
    field_bytes("Label", &record.label);
    field("Key Class", &record.key_class.to_string());
    field("Key Type", &record.key_type.to_string());
    field("Key Size", &format!("{} bits", record.key_size_bits));
    field("Effective Size", &format!("{} bits", record.effective_key_size));
    field("Extractable", &record.extractable.to_string());
    if !record.creator_module.is_empty() {
        field("Creator Module", &record.creator_module);
    }
}

fn field(name: &str, value: &str) {
    println!(" [-] {name}: {value}");
}

fn field_time(name: &str, value: Option<NaiveDateTime>) {
    match value {
        Some(time) => field(name, &time.to_string()),
        None => field(name, ""),
    }
}

fn field_fourcc(name: &str, value: Option<FourCc>) {
    match value {
        Some(code) => field(name, &code.to_string()),
        None => field(name, ""),
    }
}

/// NUL-trims a stored value and renders it as text when printable, hex
/// otherwise.
fn render(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let trimmed = &bytes[..end];
    match std::str::from_utf8(trimmed) {
        Ok(text) if text.chars().all(|c| !c.is_control()) => text.to_owned(),
        _ => hex::encode(trimmed),
    }
}

fn field_bytes(name: &str, value: &[u8]) {
    field(name, &render(value));
}

fn field_secret(name: &str, value: Option<&SecretBytes>) {
    match value {
        Some(secret) => field(name, &render(secret.as_bytes())),
        None => field(name, ""),
    }
}

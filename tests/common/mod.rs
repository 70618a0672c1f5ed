//! Shared test utilities: class file bytes and class path trees.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A minimal public class `this_class` extending `java.lang.Object`, with
/// public no-argument methods of the given names, each returning void.
pub fn class_bytes(this_class: &str, methods: &[&str]) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let utf8 = |pool: &mut Vec<Vec<u8>>, s: &str| -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
        entry.extend_from_slice(s.as_bytes());
        pool.push(entry);
        pool.len() as u16
    };
    let class = |pool: &mut Vec<Vec<u8>>, name_index: u16| -> u16 {
        let mut entry = vec![7];
        entry.extend_from_slice(&name_index.to_be_bytes());
        pool.push(entry);
        pool.len() as u16
    };

    let this_name = utf8(&mut pool, this_class);
    let this_index = class(&mut pool, this_name);
    let object_name = utf8(&mut pool, "java/lang/Object");
    let super_index = class(&mut pool, object_name);
    let void_descriptor = utf8(&mut pool, "()V");
    let method_names: Vec<u16> = methods.iter().map(|m| utf8(&mut pool, m)).collect();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&65u16.to_be_bytes());
    bytes.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
    for entry in &pool {
        bytes.extend_from_slice(entry);
    }
    bytes.extend_from_slice(&0x0021u16.to_be_bytes());
    bytes.extend_from_slice(&this_index.to_be_bytes());
    bytes.extend_from_slice(&super_index.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    bytes.extend_from_slice(&0u16.to_be_bytes()); // fields
    bytes.extend_from_slice(&(method_names.len() as u16).to_be_bytes());
    for name in method_names {
        bytes.extend_from_slice(&0x0001u16.to_be_bytes());
        bytes.extend_from_slice(&name.to_be_bytes());
        bytes.extend_from_slice(&void_descriptor.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
    }
    bytes.extend_from_slice(&0u16.to_be_bytes()); // attributes
    bytes
}

/// Write `root/<this_class>.class`, creating directories as needed.
pub fn write_class(root: &Path, this_class: &str, methods: &[&str]) -> PathBuf {
    write_class_at(&root.join(format!("{this_class}.class")), this_class, methods)
}

/// Write a class file for `this_class` at an arbitrary path.
pub fn write_class_at(path: &Path, this_class: &str, methods: &[&str]) -> PathBuf {
    fs::create_dir_all(path.parent().expect("class file has a parent directory")).unwrap();
    fs::write(path, class_bytes(this_class, methods)).unwrap();
    path.to_path_buf()
}

pub fn path_arg(path: &Path) -> String {
    path.to_str().expect("temp paths are UTF-8").to_string()
}

pub fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// The jadis binary, isolated from the user's configuration and locale.
pub fn jadis_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jadis"));
    cmd.env(
        "JADIS_CONFIG",
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/no-such-config.toml"),
    )
    .env("LC_ALL", "C")
    .env_remove("CLASSPATH")
    .env_remove("JADIS_LOG");
    cmd
}

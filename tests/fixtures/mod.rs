//! Shared builders for integration tests: compound containers, synthetic
//! test folders and an in-memory object store.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::process::Command;
use ufto_discovery::changeset::{ObjectStore, TreeEntryPair};
use ufto_discovery::error::ChangeSetError;
use walkdir::WalkDir;

pub const SECTOR_SIZE: usize = 512;
pub const MINI_SECTOR_SIZE: usize = 64;
pub const MINI_STREAM_CUTOFF: usize = 4096;

const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FREE_SECTOR: u32 = 0xFFFF_FFFF;
const FAT_SECTOR: u32 = 0xFFFF_FFFD;
const NO_STREAM: u32 = 0xFFFF_FFFF;
const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// File offset of the first directory sector written by [`compound_file`].
pub const DIRECTORY_OFFSET: usize = 2 * SECTOR_SIZE;

/// Builds a version 3 compound file whose root storage holds `streams`.
///
/// Layout: sector 0 is the FAT, the directory follows, then the mini FAT, the
/// mini stream and finally the regular streams. Streams under the cutoff go
/// to the mini stream.
pub fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    let entry_count = 1 + streams.len();
    let dir_sectors = entry_count.div_ceil(4);

    let mut mini_stream = Vec::new();
    let mut mini_fat: Vec<u32> = Vec::new();
    let mut starts: Vec<u32> = Vec::with_capacity(streams.len());
    let mut regular: Vec<(usize, &[u8])> = Vec::new();

    for (i, (_, data)) in streams.iter().enumerate() {
        if data.is_empty() {
            starts.push(END_OF_CHAIN);
        } else if data.len() < MINI_STREAM_CUTOFF {
            let first = mini_fat.len() as u32;
            let count = data.len().div_ceil(MINI_SECTOR_SIZE);
            push_chain(&mut mini_fat, first, count);
            starts.push(first);
            mini_stream.extend_from_slice(data);
            mini_stream.resize(mini_stream.len().next_multiple_of(MINI_SECTOR_SIZE), 0);
        } else {
            starts.push(0);
            regular.push((i, data));
        }
    }

    let mini_fat_sectors = (mini_fat.len() * 4).div_ceil(SECTOR_SIZE);
    let mini_stream_sectors = mini_stream.len().div_ceil(SECTOR_SIZE);

    let mut fat = vec![FAT_SECTOR];
    let first_dir = fat.len() as u32;
    push_chain(&mut fat, first_dir, dir_sectors);
    let first_mini_fat = if mini_fat_sectors > 0 {
        let first = fat.len() as u32;
        push_chain(&mut fat, first, mini_fat_sectors);
        first
    } else {
        END_OF_CHAIN
    };
    let first_mini_stream = if mini_stream_sectors > 0 {
        let first = fat.len() as u32;
        push_chain(&mut fat, first, mini_stream_sectors);
        first
    } else {
        END_OF_CHAIN
    };
    for &(i, data) in &regular {
        let first = fat.len() as u32;
        push_chain(&mut fat, first, data.len().div_ceil(SECTOR_SIZE));
        starts[i] = first;
    }
    assert!(fat.len() <= SECTOR_SIZE / 4, "fixture needs a single FAT sector");

    let mut out = header(first_dir, first_mini_fat, mini_fat_sectors as u32);
    out.extend(sector_of_u32(&fat, FREE_SECTOR));

    let mut directory = Vec::with_capacity(dir_sectors * SECTOR_SIZE);
    let root_child = if streams.is_empty() { NO_STREAM } else { 1 };
    directory.extend(dir_entry(
        "Root Entry",
        5,
        NO_STREAM,
        root_child,
        first_mini_stream,
        mini_stream.len() as u64,
    ));
    for (i, (name, data)) in streams.iter().enumerate() {
        let right = if i + 1 < streams.len() {
            i as u32 + 2
        } else {
            NO_STREAM
        };
        directory.extend(dir_entry(name, 2, right, NO_STREAM, starts[i], data.len() as u64));
    }
    directory.resize(dir_sectors * SECTOR_SIZE, 0);
    out.extend(directory);

    if mini_fat_sectors > 0 {
        let mut bytes = Vec::new();
        for chunk in mini_fat.chunks(SECTOR_SIZE / 4) {
            bytes.extend(sector_of_u32(chunk, FREE_SECTOR));
        }
        out.extend(bytes);
    }
    let mut padded_mini = mini_stream;
    padded_mini.resize(mini_stream_sectors * SECTOR_SIZE, 0);
    out.extend(padded_mini);

    for &(_, data) in &regular {
        let mut bytes = data.to_vec();
        bytes.resize(data.len().div_ceil(SECTOR_SIZE) * SECTOR_SIZE, 0);
        out.extend(bytes);
    }
    out
}

/// Overwrites the declared size of directory entry `index` (0 is the root).
pub fn set_declared_size(container: &mut [u8], index: usize, size: u64) {
    let offset = DIRECTORY_OFFSET + index * 128 + 120;
    container[offset..offset + 8].copy_from_slice(&size.to_le_bytes());
}

fn push_chain(table: &mut Vec<u32>, first: u32, count: usize) {
    for i in 0..count {
        let next = if i + 1 == count {
            END_OF_CHAIN
        } else {
            first + i as u32 + 1
        };
        table.push(next);
    }
}

fn sector_of_u32(values: &[u32], fill: u32) -> Vec<u8> {
    let mut bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    while bytes.len() < SECTOR_SIZE {
        bytes.extend(fill.to_le_bytes());
    }
    bytes
}

fn header(first_dir: u32, first_mini_fat: u32, mini_fat_count: u32) -> Vec<u8> {
    let mut h = vec![0u8; SECTOR_SIZE];
    h[..8].copy_from_slice(&SIGNATURE);
    h[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
    h[26..28].copy_from_slice(&3u16.to_le_bytes());
    h[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
    h[30..32].copy_from_slice(&9u16.to_le_bytes());
    h[32..34].copy_from_slice(&6u16.to_le_bytes());
    h[44..48].copy_from_slice(&1u32.to_le_bytes());
    h[48..52].copy_from_slice(&first_dir.to_le_bytes());
    h[56..60].copy_from_slice(&(MINI_STREAM_CUTOFF as u32).to_le_bytes());
    h[60..64].copy_from_slice(&first_mini_fat.to_le_bytes());
    h[64..68].copy_from_slice(&mini_fat_count.to_le_bytes());
    h[68..72].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    h[72..76].copy_from_slice(&0u32.to_le_bytes());
    for i in 0..109 {
        let offset = 76 + i * 4;
        let value = if i == 0 { 0 } else { FREE_SECTOR };
        h[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    h
}

fn dir_entry(name: &str, kind: u8, right: u32, child: u32, start: u32, size: u64) -> Vec<u8> {
    let mut e = vec![0u8; 128];
    let units: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    for (i, unit) in units.iter().enumerate() {
        e[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    e[64..66].copy_from_slice(&((units.len() * 2) as u16).to_le_bytes());
    e[66] = kind;
    e[67] = 1;
    e[68..72].copy_from_slice(&NO_STREAM.to_le_bytes());
    e[72..76].copy_from_slice(&right.to_le_bytes());
    e[76..80].copy_from_slice(&child.to_le_bytes());
    e[116..120].copy_from_slice(&start.to_le_bytes());
    e[120..128].copy_from_slice(&size.to_le_bytes());
    e
}

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// `ComponentInfo` payload: a short binary prefix followed by UTF-16LE XML.
pub fn component_info(xml: &str) -> Vec<u8> {
    let mut payload = vec![0x2A, 0x00, 0x01, 0x00, 0x00, 0x00];
    payload.extend(utf16le(xml));
    payload
}

pub fn gui_test_xml(description: &str, actions: &[(&str, Option<&str>)]) -> String {
    let mut xml = format!("<Test><Description>{description}</Description><Components>");
    xml.push_str("<Component>Action0</Component>");
    for (name, _) in actions {
        xml.push_str(&format!("<Component>{name}</Component>"));
    }
    xml.push_str("</Components><Dependencies>");
    for (name, logical) in actions {
        if let Some(logical) = logical {
            xml.push_str(&format!(
                r#"<Dependency Type="1" Kind="16" Scope="0" Logical="{logical}">{name}\ObjectRepository.bdb</Dependency>"#
            ));
        }
    }
    xml.push_str("</Dependencies></Test>");
    xml
}

pub fn resource_xml(description: &str, params: &[(&str, u8, Option<&str>)]) -> String {
    let mut xml = format!("<Resource><Description>{description}</Description><ArgumentsCollection>");
    for (name, direction, default) in params {
        xml.push_str(&format!(
            "<Argument><ArgName>{name}</ArgName><ArgDirection>{direction}</ArgDirection>"
        ));
        if let Some(default) = default {
            xml.push_str(&format!("<ArgDefaultValue>{default}</ArgDefaultValue>"));
        }
        xml.push_str("</Argument>");
    }
    xml.push_str("</ArgumentsCollection></Resource>");
    xml
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Writes `<test_dir>/Test.tsp` holding `xml` in its `ComponentInfo` stream.
pub fn write_gui_test(test_dir: &Path, xml: &str) {
    let payload = component_info(xml);
    write_file(
        &test_dir.join("Test.tsp"),
        compound_file(&[("ComponentInfo", payload.as_slice())]),
    );
}

pub fn write_action_resource(action_dir: &Path, xml: &str) {
    let payload = component_info(xml);
    write_file(
        &action_dir.join("resource.mtr"),
        compound_file(&[("ComponentInfo", payload.as_slice())]),
    );
}

/// Writes `<test_dir>/<name>.st` and an `actions.xml` with a main action.
pub fn write_api_test(test_dir: &Path, description: &str) {
    let name = test_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    write_file(&test_dir.join(format!("{name}.st")), "<Test/>");
    write_file(
        &test_dir.join("actions.xml"),
        format!(
            r#"<Actions><Action internalName="MainAction" userDefinedName="{name}" description="{description}" /></Actions>"#
        ),
    );
}

/// Object store holding named snapshots of a working tree. Blob ids are
/// content hashes, so identical files share an id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    commits: HashMap<String, BTreeMap<String, String>>,
    blobs: HashMap<String, Vec<u8>>,
    head: String,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every file under `work_dir` (except the `.git` folder and the
    /// sync marker) as commit `id`, which becomes the head.
    pub fn snapshot(&mut self, id: &str, work_dir: &Path) {
        let mut tree = BTreeMap::new();
        for entry in WalkDir::new(work_dir)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .flatten()
            .filter(|e| e.file_type().is_file())
        {
            if entry.file_name() == ".synced-commit-sha.txt" {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(work_dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let content = fs::read(entry.path()).unwrap();
            let blob_id = blob_id(&content);
            self.blobs.insert(blob_id.clone(), content);
            tree.insert(relative, blob_id);
        }
        self.commits.insert(id.to_string(), tree);
        self.head = id.to_string();
    }

    pub fn set_head(&mut self, id: &str) {
        self.head = id.to_string();
    }

    fn tree(&self, rev: &str) -> Result<BTreeMap<String, String>, ChangeSetError> {
        self.commits
            .get(rev)
            .cloned()
            .ok_or_else(|| ChangeSetError::unknown_revision(rev))
    }
}

impl ObjectStore for InMemoryStore {
    fn walk_trees(&self, old: &str, new: &str) -> Result<Vec<TreeEntryPair>, ChangeSetError> {
        Ok(TreeEntryPair::merge(self.tree(old)?, self.tree(new)?))
    }

    fn read_blob(&self, id: &str, path: &str) -> Result<Vec<u8>, ChangeSetError> {
        self.blobs
            .get(id)
            .cloned()
            .ok_or_else(|| ChangeSetError::blob_unreadable(id, path, "no such blob"))
    }

    fn resolve_head(&self) -> Result<String, ChangeSetError> {
        Ok(self.head.clone())
    }
}

fn blob_id(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// True when a `git` binary can be run; git-backed tests return early otherwise.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.name", "Discovery Tests"]);
    git(dir, &["config", "user.email", "discovery@example.test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Stages everything and commits, returning the new commit id.
pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

use std::{
    fs,
    io::{ErrorKind, Read, Write},
    ops::Deref,
    path::PathBuf,
};

use anyhow::Result;
use fs4::fs_std::FileExt;
#[cfg(test)]
use mockall::automock;

/// Interface for abstracting durable key-value persistence. Instantiated once
/// per process and passed explicitly into the stores that need it.
#[cfg_attr(test, automock)]
pub trait KvStore {
    /// Returns the stored value for `key`, or None if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: Deref> KvStore for T
where
    T::Target: KvStore,
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.deref().get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.deref().set(key, value)
    }
}

/// The main realization of [KvStore]. Each key maps to its own file so a
/// rewrite of one key can never touch the others.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "-")))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut file = match fs::File::open(self.key_path(key)) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Semi-safe acquire-release for a file
        FileExt::lock_shared(&file)?;
        let mut raw = String::new();
        let result = file.read_to_string(&mut raw);
        FileExt::unlock(&file)?;
        result?;

        Ok(Some(raw))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let file = fs::File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.key_path(key))?;

        FileExt::lock_exclusive(&file)?;
        let result = overwrite(&file, value);
        FileExt::unlock(&file)?;
        result
    }
}

fn overwrite(mut file: &fs::File, value: &str) -> Result<()> {
    file.set_len(0)?;
    file.write_all(value.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Map-backed store for exercising the punch and session layers without a disk.
#[cfg(test)]
pub struct MemoryKvStore(std::sync::Mutex<std::collections::HashMap<String, String>>);

#[cfg(test)]
impl MemoryKvStore {
    pub fn new() -> Self {
        Self(std::sync::Mutex::new(std::collections::HashMap::new()))
    }
}

#[cfg(test)]
impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

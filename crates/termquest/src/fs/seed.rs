//! The challenge tree every terminal session starts from

use std::path::Path;

use super::memory::InMemoryFs;
use super::traits::DEFAULT_FILE_MODE;

const COMMANDS_TXT: &str = "Available Commands:

- sudo: Run command as superuser
- chmod: Change file mode bits (permissions)
- chown: Change file owner
- head: Show first lines of a file
- tail: Show last lines of a file
- grep: Search for a string in a file
- touch: Create a new empty file
- mkdir: Create a directory
- rm: Remove a file
- rmdir: Remove an empty directory
- echo: Print text or write to a file
- mv: Move or rename a file
- cp: Copy a file
- base64: Encode or decode base64
- help: List available commands
- about: About this terminal
- whoami: Show user name
- pwd: Print working directory
- ls: List files and directories
- cd: Change directory
- cat: Show file contents
- date: Show current date/time
- clear: Clear the terminal

Example usages:
- ls -la   # List all files with details
- base64 -d flag.b64   # Decode base64 file
- grep 'pattern' file.txt   # Search for 'pattern' in file.txt
- chmod 600 secret.txt   # Set permissions to 600
- sudo chown user editme.txt   # Change owner with sudo

Each command is used for different tasks in the challenges.";

const LEVEL1_TASKS: &str = "Level 1: Sudo & Permissions
A file called 'editme.txt' is owned by root. Find the sudo password, use sudo to take ownership, and edit the file to contain 'Mission Complete'.";

const LEVEL2_TASKS: &str = "Level 2: Encoding
A file called 'flag.b64' contains a base64-encoded flag. Decode it to reveal the flag and win.";

const LEVEL3_TASKS: &str = "Level 3: File Creation & Permissions
Create a file called 'secret.txt' in this folder, write 'Top Secret' inside, and set its permissions to 600 so only you can read/write it.";

/// Files of the seed tree: `(path, content, owner)`.
const SEED_FILES: &[(&str, &str, &str)] = &[
    ("/home/user/readme.txt", "Welcome to your home directory!", "user"),
    ("/home/user/commands.txt", COMMANDS_TXT, "user"),
    ("/home/user/level1/tasks.txt", LEVEL1_TASKS, "user"),
    ("/home/user/level1/.sudo_password", "hunter2", "user"),
    ("/home/user/level1/editme.txt", "Edit me to win!", "root"),
    ("/home/user/level2/tasks.txt", LEVEL2_TASKS, "user"),
    (
        "/home/user/level2/flag.b64",
        "RkxBRy1MRVZFMjogWW91IGRlY29kZWQgdGhlIGZsYWch",
        "user",
    ),
    ("/home/user/level3/tasks.txt", LEVEL3_TASKS, "user"),
];

impl InMemoryFs {
    /// Create a filesystem holding the three challenge levels under
    /// `/home/user` and an empty `/tmp`.
    pub fn seeded() -> Self {
        let fs = Self::new();
        fs.populate_seed();
        fs
    }

    fn populate_seed(&self) {
        for (path, content, owner) in SEED_FILES {
            self.insert_file(Path::new(path), content, DEFAULT_FILE_MODE, owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;

    #[tokio::test]
    async fn test_seed_layout() {
        let fs = InMemoryFs::seeded();

        let names: Vec<_> = fs
            .read_dir(Path::new("/home/user"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec!["commands.txt", "level1", "level2", "level3", "readme.txt"]
        );

        let editme = fs
            .stat(Path::new("/home/user/level1/editme.txt"))
            .await
            .unwrap();
        assert_eq!(editme.owner, "root");
        assert_eq!(editme.mode, "0644");

        assert_eq!(
            fs.read_file(Path::new("/home/user/level1/.sudo_password"))
                .await
                .unwrap(),
            "hunter2"
        );
        assert!(fs.read_dir(Path::new("/tmp")).await.unwrap().is_empty());
        assert!(fs.read_dir(Path::new("/home/user/level3")).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let a = InMemoryFs::seeded();
        let b = InMemoryFs::seeded();
        a.remove(Path::new("/home/user/readme.txt"), false)
            .await
            .unwrap();
        assert!(b.exists(Path::new("/home/user/readme.txt")).await.unwrap());
    }
}

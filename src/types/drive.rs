// ABOUTME: Validated host drive identifier (Windows letter or the Unix root).
// ABOUTME: Drives name the filesystem roots a manager container must bind-mount.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("not a drive letter: '{0}'")]
    NotALetter(char),
}

/// A single host drive, stored as a lowercase ASCII letter.
///
/// On Unix there is only one root and this type is never constructed; on
/// Windows and WSL each translated image path records the drive it touches
/// so the launch can fail fast when Docker is not sharing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Drive(char);

impl Drive {
    pub fn new(letter: char) -> Result<Self, DriveError> {
        if !letter.is_ascii_alphabetic() {
            return Err(DriveError::NotALetter(letter));
        }
        Ok(Self(letter.to_ascii_lowercase()))
    }

    pub fn letter(&self) -> char {
        self.0
    }

    /// All candidate drive letters, lowercase a-z.
    pub fn all() -> impl Iterator<Item = Drive> {
        ('a'..='z').map(Drive)
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_letter() {
        assert_eq!(Drive::new('C').unwrap().letter(), 'c');
    }

    #[test]
    fn rejects_non_letter() {
        assert!(Drive::new('3').is_err());
    }

    #[test]
    fn all_covers_the_alphabet() {
        let letters: Vec<char> = Drive::all().map(|d| d.letter()).collect();
        assert_eq!(letters.len(), 26);
        assert_eq!(letters.first(), Some(&'a'));
        assert_eq!(letters.last(), Some(&'z'));
    }
}

//! Column resolution: which header position feeds which channel.

use serde::Serialize;

/// A semantic quantity read from one column of the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    PositionX,
    PositionY,
    PositionZ,
    ColorR,
    ColorG,
    ColorB,
    ColorA,
    Size,
    Labels,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::PositionX,
        Channel::PositionY,
        Channel::PositionZ,
        Channel::ColorR,
        Channel::ColorG,
        Channel::ColorB,
        Channel::ColorA,
        Channel::Size,
        Channel::Labels,
    ];

    /// The header name hosts use for this channel. Matching is case-sensitive.
    pub const fn column_name(self) -> &'static str {
        match self {
            Channel::PositionX => "position.x",
            Channel::PositionY => "position.y",
            Channel::PositionZ => "position.z",
            Channel::ColorR => "color.r",
            Channel::ColorG => "color.g",
            Channel::ColorB => "color.b",
            Channel::ColorA => "color.a",
            Channel::Size => "size",
            Channel::Labels => "labels",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|c| c.column_name() == name.trim())
    }
}

/// Index of the first column named `name`, or `None` when absent.
pub fn resolve<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    header.iter().position(|h| h.as_ref().trim() == name)
}

/// Resolved positions of every channel for one header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub x: Option<usize>,
    pub y: Option<usize>,
    pub z: Option<usize>,
    pub r: Option<usize>,
    pub g: Option<usize>,
    pub b: Option<usize>,
    pub a: Option<usize>,
    pub size: Option<usize>,
    pub labels: Option<usize>,
}

impl ColumnMap {
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Self {
        let at = |c: Channel| resolve(header, c.column_name());
        Self {
            x: at(Channel::PositionX),
            y: at(Channel::PositionY),
            z: at(Channel::PositionZ),
            r: at(Channel::ColorR),
            g: at(Channel::ColorG),
            b: at(Channel::ColorB),
            a: at(Channel::ColorA),
            size: at(Channel::Size),
            labels: at(Channel::Labels),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<usize> {
        match channel {
            Channel::PositionX => self.x,
            Channel::PositionY => self.y,
            Channel::PositionZ => self.z,
            Channel::ColorR => self.r,
            Channel::ColorG => self.g,
            Channel::ColorB => self.b,
            Channel::ColorA => self.a,
            Channel::Size => self.size,
            Channel::Labels => self.labels,
        }
    }

    /// `[r, g, b, a]`
    pub fn color(&self) -> [Option<usize>; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels the header does not provide.
    pub fn missing(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|&c| self.get(c).is_none())
            .collect()
    }

    /// Header names that map to no channel. These are ignored.
    pub fn unrecognized<S: AsRef<str>>(header: &[S]) -> Vec<&str> {
        header
            .iter()
            .map(|h| h.as_ref())
            .filter(|h| Channel::from_column_name(h).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_match() {
        let header = ["size", "position.x", "position.x"];
        assert_eq!(resolve(&header, "position.x"), Some(1));
        assert_eq!(resolve(&header, "size"), Some(0));
    }

    #[test]
    fn absent_name_is_none() {
        let header = ["a", "b"];
        assert_eq!(resolve(&header, "position.x"), None);
        let empty: [&str; 0] = [];
        assert_eq!(resolve(&empty, "size"), None);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(resolve(&["Position.X"], "position.x"), None);
        assert_eq!(resolve(&["SIZE"], "size"), None);
    }

    #[test]
    fn header_whitespace_is_ignored() {
        assert_eq!(resolve(&[" labels  "], "labels"), Some(0));
    }

    #[test]
    fn column_map_covers_every_channel() {
        let header: Vec<String> = Channel::ALL
            .iter()
            .rev()
            .map(|c| c.column_name().to_string())
            .collect();
        let map = ColumnMap::resolve(&header);
        for (i, channel) in Channel::ALL.iter().rev().enumerate() {
            assert_eq!(map.get(*channel), Some(i));
        }
        assert!(map.missing().is_empty());
    }

    #[test]
    fn reports_missing_and_unrecognized() {
        let header = ["position.x", "temperature", "color.g"];
        let map = ColumnMap::resolve(&header);
        assert_eq!(map.color(), [None, Some(2), None, None]);
        assert_eq!(map.missing().len(), 7);
        assert_eq!(ColumnMap::unrecognized(&header), vec!["temperature"]);
    }
}

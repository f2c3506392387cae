//! Enumerations with wire keys.
//!
//! Every enum has an `Unknown` variant. Parsing a wire value never fails:
//! keys are matched case-insensitively and anything unrecognised becomes
//! `Unknown`, so new server-side values do not break decoding.

use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $key:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Value not known to this client
            Unknown,
        }

        impl $name {
            /// Every known variant, `Unknown` excluded.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire key of this value.
            #[must_use]
            pub const fn key(self) -> &'static str {
                match self {
                    $( Self::$variant => $key, )+
                    Self::Unknown => "unknown",
                }
            }

            /// Parse a wire key, case-insensitively. Never fails.
            #[must_use]
            pub fn from_key(key: &str) -> Self {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.key().eq_ignore_ascii_case(key.trim()))
                    .unwrap_or(Self::Unknown)
            }

            /// Whether this is the `Unknown` sentinel.
            #[must_use]
            pub const fn is_unknown(self) -> bool {
                matches!(self, Self::Unknown)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.key())
            }
        }
    };
}

wire_enum! {
    /// A vote on a post or comment
    Vote {
        /// Upvote
        Up => "up",
        /// Downvote
        Down => "down",
        /// Withdraw a previous vote
        Veto => "veto",
    }
}

wire_enum! {
    /// Who can see an album
    AlbumPrivacy {
        /// Listed publicly
        Public => "public",
        /// Reachable by link only
        Hidden => "hidden",
        /// Owner only
        Secret => "secret",
    }
}

wire_enum! {
    /// How an album is laid out
    AlbumLayout {
        /// One image after another with descriptions
        Blog => "blog",
        /// Thumbnail grid
        Grid => "grid",
        /// Horizontal strip
        Horizontal => "horizontal",
        /// Vertical strip
        Vertical => "vertical",
    }
}

wire_enum! {
    /// Ordering of a comment listing
    CommentSort {
        /// Highest rated first
        Best => "best",
        /// Most points first
        Top => "top",
        /// Newest first
        New => "new",
    }
}

wire_enum! {
    /// Section of the gallery
    GallerySection {
        /// Most viral
        Hot => "hot",
        /// Highest scoring
        Top => "top",
        /// User submitted
        User => "user",
    }
}

wire_enum! {
    /// Ordering of a gallery listing
    GallerySort {
        /// By virality
        Viral => "viral",
        /// By score
        Top => "top",
        /// By submission time
        Time => "time",
        /// Gaining traction; only meaningful in the user section
        Rising => "rising",
    }
}

wire_enum! {
    /// Time window of a `top` gallery listing
    GalleryTimeWindow {
        /// Last day
        Day => "day",
        /// Last week
        Week => "week",
        /// Last month
        Month => "month",
        /// Last year
        Year => "year",
        /// All time
        All => "all",
    }
}

wire_enum! {
    /// Image size filter of an advanced gallery search
    SearchImageSize {
        /// Up to 500 pixels square
        Small => "small",
        /// 500 to 2000 pixels square
        Medium => "med",
        /// 2000 to 5000 pixels square
        Big => "big",
        /// 5000 to 10000 pixels square
        Large => "lrg",
        /// Over 10000 pixels square
        Huge => "huge",
    }
}

wire_enum! {
    /// How an upload's content is supplied
    FileType {
        /// Binary file
        File => "file",
        /// Base64 encoded data
        Base64 => "base64",
        /// Remote url
        Url => "url",
    }
}

wire_enum! {
    /// Reason attached to a report
    ReportReason {
        /// Does not belong on the site
        DoesNotBelong => "1",
        /// Spam
        Spam => "3",
        /// Abusive
        Abusive => "4",
        /// Mature content not marked as such
        MatureNotMarked => "5",
        /// Pornography
        Pornography => "6",
    }
}

impl Default for CommentSort {
    fn default() -> Self {
        Self::Best
    }
}

impl Default for GallerySection {
    fn default() -> Self {
        Self::Hot
    }
}

impl Default for GallerySort {
    fn default() -> Self {
        Self::Viral
    }
}

impl Default for GalleryTimeWindow {
    fn default() -> Self {
        Self::Day
    }
}

//! PDF permissions according to ISO 32000-1 Table 22
//!
//! The `/P` entry is a 32-bit bitmask. Bits 1–2 must be zero, bits 7–8 and
//! 13–32 are reserved and must be one; the reserved pattern is preserved
//! through [`Permissions::from_p`] round trips.

use bitflags::bitflags;

/// Base value with all operations denied and every reserved bit set.
const RESERVED_BITS: u32 = 0xFFFF_F0C0;

bitflags! {
    /// Operations available to a non-owner credential.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        /// Print the document (bit 3).
        const PRINT = 1 << 2;
        /// Modify document contents (bit 4).
        const MODIFY_CONTENTS = 1 << 3;
        /// Copy text and graphics (bit 5).
        const COPY = 1 << 4;
        /// Add or modify annotations (bit 6).
        const MODIFY_ANNOTATIONS = 1 << 5;
        /// Fill in form fields (bit 9).
        const FILL_FORMS = 1 << 8;
        /// Extract text and graphics for accessibility (bit 10).
        const EXTRACT_ACCESSIBLE = 1 << 9;
        /// Assemble the document: insert, rotate, delete pages (bit 11).
        const ASSEMBLE = 1 << 10;
        /// Print at full resolution (bit 12).
        const PRINT_HIGH_QUALITY = 1 << 11;

        // Reserved bits are carried verbatim.
        const _ = !0;
    }
}

impl Permissions {
    /// All operations denied.
    pub fn none_allowed() -> Self {
        Self::from_bits_retain(RESERVED_BITS)
    }

    /// All operations allowed.
    pub fn all_allowed() -> Self {
        Self::from_bits_retain(
            RESERVED_BITS
                | Self::PRINT.bits()
                | Self::MODIFY_CONTENTS.bits()
                | Self::COPY.bits()
                | Self::MODIFY_ANNOTATIONS.bits()
                | Self::FILL_FORMS.bits()
                | Self::EXTRACT_ACCESSIBLE.bits()
                | Self::ASSEMBLE.bits()
                | Self::PRINT_HIGH_QUALITY.bits(),
        )
    }

    /// Interpret a raw `/P` value (stored signed in the file).
    pub fn from_p(p: i32) -> Self {
        Self::from_bits_retain(p as u32)
    }

    /// The signed `/P` value for the encryption dictionary.
    pub fn as_p(&self) -> i32 {
        self.bits() as i32
    }

    pub fn can_print(&self) -> bool {
        self.contains(Self::PRINT)
    }

    pub fn can_modify_contents(&self) -> bool {
        self.contains(Self::MODIFY_CONTENTS)
    }

    pub fn can_copy(&self) -> bool {
        self.contains(Self::COPY)
    }

    pub fn can_modify_annotations(&self) -> bool {
        self.contains(Self::MODIFY_ANNOTATIONS)
    }

    pub fn can_fill_forms(&self) -> bool {
        self.contains(Self::FILL_FORMS)
    }

    pub fn can_extract_accessible(&self) -> bool {
        self.contains(Self::EXTRACT_ACCESSIBLE)
    }

    pub fn can_assemble(&self) -> bool {
        self.contains(Self::ASSEMBLE)
    }

    pub fn can_print_high_quality(&self) -> bool {
        self.contains(Self::PRINT_HIGH_QUALITY)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::none_allowed()
    }
}

use anyhow::{Context, Result};
use regex::{Captures, Regex};

/// Rewrites analyst post text before it is exposed to the public group.
///
/// The rules run once each, in a fixed order, and each rule sees the output
/// of the previous one:
///   1. `<title> - <name>` becomes `<b>name, title</b>`
///   2. `Name: <name>` bolds the name
///   3. `Designation: <role>` bolds the role
///   4. phone-shaped digit runs are removed
///   5. email addresses are removed
///   6. `@mentions` are removed unless they contain the admin contact
///   7. a contact footer is appended when the admin contact is absent
///   8. surrounding whitespace is trimmed
///
/// The order is significant: rules 4-6 operate on the bolded output of 1-3,
/// and rule 7 observes everything the earlier rules left behind.
pub struct Sanitizer {
    admin_contact: String,
    title_re: Regex,
    name_re: Regex,
    designation_re: Regex,
    phone_re: Regex,
    email_re: Regex,
    mention_re: Regex,
}

impl Sanitizer {
    pub fn new(admin_contact: &str) -> Result<Self> {
        Ok(Self {
            admin_contact: admin_contact.to_string(),
            title_re: Regex::new(
                r"(?i)(Research Analyst|Senior Analyst|Chief Analyst|Analyst)\s*[-:]\s*(\w+\s+\w+)",
            )
            .context("Failed to compile title pattern")?,
            name_re: Regex::new(r"(?i)(Name\s*:\s*)(\w+\s+\w+)")
                .context("Failed to compile name pattern")?,
            designation_re: Regex::new(r"(?i)(Designation\s*:\s*)(\w+\s*\w*)")
                .context("Failed to compile designation pattern")?,
            phone_re: Regex::new(r"\+?\d[\d\s()-]{8,}\d")
                .context("Failed to compile phone pattern")?,
            email_re: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .context("Failed to compile email pattern")?,
            mention_re: Regex::new(r"@\w+").context("Failed to compile mention pattern")?,
        })
    }

    /// The trailing line appended to relayed posts that lost all contact info.
    pub fn contact_footer(&self) -> String {
        format!("📞 For inquiries, contact: {}", self.admin_contact)
    }

    pub fn apply(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = self.title_re.replace_all(text, "<b>${2}, ${1}</b>");
        let text = self.name_re.replace_all(&text, "${1}<b>${2}</b>");
        let text = self.designation_re.replace_all(&text, "${1}<b>${2}</b>");
        let text = self.phone_re.replace_all(&text, "");
        let text = self.email_re.replace_all(&text, "");

        let admin = self.admin_contact.as_str();
        let text = self.mention_re.replace_all(&text, |caps: &Captures| {
            let mention = &caps[0];
            if mention.contains(admin) {
                mention.to_string()
            } else {
                String::new()
            }
        });

        let mut out = text.into_owned();
        if !out.contains(admin) {
            out.push_str("\n\n");
            out.push_str(&self.contact_footer());
        }
        out.trim().to_string()
    }
}

//! Code-review template.
//!
//! Layout:
//! ```text
//! system     persona
//! user       review request (quality, bugs, security, 1-5 scores)
//! assistant  acknowledgment asking for the guideline
//! ...        flattened prior turns
//! user       guideline block: review template + diff-style suggestion format
//! user       the code under review
//! ```

use parley_types::conversation::Turn;
use parley_types::llm::Message;

use super::{PromptSettings, flatten_turns};

const REVIEW_PERSONA: &str = "You are a programming specialist assisting a programmer.";

const REVIEW_REQUEST: &str = "I want you to review my code for quality, bugs, and security issues. \
Score the code from 1 to 5 on readability, maintainability, coding style and security.";

const REVIEW_ACKNOWLEDGMENT: &str =
    "OK, I will review your code. Please let me know the guideline for the code review first.";

/// Diff-style suggestion example repeated for each allowed suggestion slot.
const SUGGESTION_EXAMPLE: &str = "\
# ... Omitting unchanged lines
- def func():
-    vl = 1
-    return val

+ def func():
+    val = 1  # <-- Comment explaining change
+    return val
# ... Omitting unchanged lines";

/// Maximum number of code-change suggestions the review may contain.
pub const MAX_SUGGESTIONS: usize = 3;

/// The guideline block: structured review template plus suggestion format.
pub fn review_guideline(settings: &PromptSettings) -> String {
    let examples = (1..=MAX_SUGGESTIONS)
        .map(|n| {
            format!(
                "# {n}. Suggestion comment\n# (e.g., The variable name is not clear)\n{SUGGESTION_EXAMPLE}"
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Here is the guideline for the code review.\n\
[Review Guideline]\n\
The review format guide is as follows:\n\
1. The Bugs section is optional. Add it only if you find bugs.\n\
2. The Code changes suggestion section is optional. Add it only if you need to suggest code changes.\n\
3. The Code changes suggestion section is limited to {MAX_SUGGESTIONS} suggestions.\n\
4. Put `N/A` in a section if you have no comments.\n\
5. The review must be written in {language}.\n\
\n\
The review template is as follows:\n\
## Score and comments\n\
* Readability: */5 (e.g., Clear variable names)\n\
* Maintainability: */5 (e.g., Modular structure)\n\
* Security: */5 (e.g., No sensitive data exposed)\n\
* Coding Style: */5 (e.g., Follows the language style guide)\n\
* Overall: */5 (e.g., Well-organized code)\n\
\n\
## Bugs\n\
* Bug1\n\
(e.g., Missing validation for user input)\n\
* Bug2\n\
* Bug3\n\
\n\
## Code changes suggestion\n\
* Suggestion1\n\
* Suggestion2\n\
* Suggestion3\n\
\n\
Code changes suggestion rules and format are as follows:\n\
* Rules: Looks like the output of the `diff` command. The `+` sign marks a changed or added line \
and the `-` sign marks a deleted line.\n\
* Format:\n\
```diff\n\
{examples}\n\
```\n",
        language = settings.language,
    )
}

/// Build the review scaffold around `code`.
pub fn code_review_messages(settings: &PromptSettings, prior: &[Turn], code: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(prior.len() * 2 + 5);
    messages.push(Message::system(REVIEW_PERSONA));
    messages.push(Message::user(REVIEW_REQUEST));
    messages.push(Message::assistant(REVIEW_ACKNOWLEDGMENT));
    messages.extend(flatten_turns(prior));
    messages.push(Message::user(review_guideline(settings)));
    messages.push(Message::user(format!("Here is the code:\n```\n{code}\n```")));
    messages
}

//! 验证码邮件内容

use super::CodePurpose;

/// 渲染后的验证码邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl VerificationEmail {
    /// 渲染邮件
    ///
    /// ```rust
    /// use login_code::delivery::{CodePurpose, VerificationEmail};
    ///
    /// let email = VerificationEmail::render("004521", CodePurpose::Login, 10);
    /// assert!(email.text.contains("004521"));
    /// assert!(email.text.contains("10 minutes"));
    /// ```
    pub fn render(code: &str, purpose: CodePurpose, ttl_minutes: u64) -> Self {
        let (subject, action, completion) = match purpose {
            CodePurpose::Login => (
                "Your verification code - Sign in",
                "sign in to",
                "finish signing in",
            ),
            CodePurpose::Register => (
                "Your verification code - Create account",
                "create an account on",
                "finish creating your account",
            ),
        };

        let text = format!(
            "Verification code - Course Catalog\n\
             \n\
             Hello,\n\
             \n\
             You asked to {action} our learning platform.\n\
             \n\
             Your verification code is: {code}\n\
             \n\
             IMPORTANT:\n\
             - This code expires in {ttl_minutes} minutes\n\
             - Do not share this code with anyone\n\
             - If you did not request this code, ignore this email\n\
             \n\
             Go back to the application and enter the code to {completion}.\n\
             \n\
             The Course Catalog team\n"
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"></head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <h1>Course Catalog</h1>
      <p>You asked to {action} our learning platform.</p>
      <div style="border: 2px dashed #667eea; padding: 20px; text-align: center; border-radius: 8px;">
        <p style="margin: 0; color: #666;">Your verification code is:</p>
        <div style="font-size: 32px; font-weight: bold; letter-spacing: 8px;">{code}</div>
      </div>
      <ul>
        <li>This code expires in <strong>{ttl_minutes} minutes</strong></li>
        <li>Do not share this code with anyone</li>
        <li>If you did not request this code, ignore this email</li>
      </ul>
      <p>Go back to the application and enter the code to {completion}.</p>
    </div>
  </body>
</html>
"#
        );

        Self {
            subject: subject.to_string(),
            text,
            html,
        }
    }
}

//! Server-rendered pages. Plain string rendering with explicit escaping;
//! every user-controlled value goes through [`escape`].

use crate::domain::error::FieldError;
use crate::domain::identity::Identity;
use crate::domain::ownership::can_mutate;
use crate::domain::post::PostWithAuthor;
use crate::presentation::forms::{LoginForm, PostForm, SignupForm};

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, identity: &Identity, body: &str) -> String {
    let nav = match identity {
        Identity::User(profile) => format!(
            r#"<span>signed in as <strong>{}</strong></span> <a href="/">home</a> <a href="/logout/">log out</a>"#,
            escape(&profile.username)
        ),
        Identity::Anonymous => {
            r#"<a href="/">home</a> <a href="/login/">log in</a> <a href="/signup/">sign up</a>"#
                .to_string()
        }
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - miniblog</title>
<style>
body {{ font-family: sans-serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; }}
nav {{ display: flex; gap: 1rem; border-bottom: 1px solid #ccc; padding-bottom: .5rem; }}
article {{ border-bottom: 1px solid #eee; padding: .75rem 0; }}
.error {{ color: #b00020; margin: .25rem 0; }}
.notice {{ color: #1b5e20; margin: .25rem 0; }}
.meta {{ color: #666; font-size: .85rem; }}
label {{ display: block; margin-top: .5rem; }}
input, textarea {{ width: 100%; box-sizing: border-box; }}
</style>
</head>
<body>
<nav>{nav}</nav>
{body}
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        body = body
    )
}

fn field_errors(errors: &[FieldError], field: &str) -> String {
    errors
        .iter()
        .filter(|e| e.field == field)
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(&e.message)))
        .collect()
}

fn post_article(identity: &Identity, found: &PostWithAuthor) -> String {
    let owner_links = if can_mutate(identity, &found.post) {
        format!(
            r#" <a href="/update/{id}">edit</a> <a href="/delete/{id}">delete</a>"#,
            id = found.post.id
        )
    } else {
        String::new()
    };

    format!(
        r#"<article>
<h2>{title}</h2>
<p>{content}</p>
<p class="meta">by {author} on {created}{owner_links}</p>
</article>"#,
        title = escape(&found.post.title),
        content = escape(&found.post.content),
        author = escape(&found.author.username),
        created = found.post.created_at.format("%Y-%m-%d %H:%M"),
        owner_links = owner_links
    )
}

fn post_form(action: &str, submit: &str, form: &PostForm, errors: &[FieldError]) -> String {
    format!(
        r#"<form method="post" action="{action}">
<label for="title">Title</label>
<input id="title" name="title" maxlength="50" value="{title}">
{title_errors}
<label for="content">Content</label>
<textarea id="content" name="content" rows="4">{content}</textarea>
{content_errors}
<p><button type="submit">{submit}</button></p>
</form>"#,
        action = escape(action),
        title = escape(&form.title),
        title_errors = field_errors(errors, "title"),
        content = escape(&form.content),
        content_errors = field_errors(errors, "content"),
        submit = escape(submit)
    )
}

pub fn home_page(
    identity: &Identity,
    posts: &[PostWithAuthor],
    form: &PostForm,
    errors: &[FieldError],
) -> String {
    let composer = if identity.is_authenticated() {
        format!("<h1>Write a post</h1>{}", post_form("/", "Publish", form, errors))
    } else {
        r#"<p><a href="/login/">Log in</a> to write a post.</p>"#.to_string()
    };

    let listing = if posts.is_empty() {
        "<p>No posts yet.</p>".to_string()
    } else {
        posts.iter().map(|p| post_article(identity, p)).collect()
    };

    let body = format!("{composer}<h1>Latest posts</h1>{listing}");
    layout("Home", identity, &body)
}

pub fn update_page(
    identity: &Identity,
    post_id: i64,
    form: &PostForm,
    errors: &[FieldError],
) -> String {
    let body = format!(
        "<h1>Edit post</h1>{}",
        post_form(&format!("/update/{post_id}"), "Save", form, errors)
    );
    layout("Edit post", identity, &body)
}

pub fn delete_page(identity: &Identity, found: &PostWithAuthor) -> String {
    let body = format!(
        r#"<h1>Delete post</h1>
<p>Delete &quot;{title}&quot;? This cannot be undone.</p>
{article}
<form method="post" action="/delete/{id}">
<p><button type="submit">Delete</button> <a href="/">Cancel</a></p>
</form>"#,
        title = escape(&found.post.title),
        article = post_article(identity, found),
        id = found.post.id
    );
    layout("Delete post", identity, &body)
}

pub fn signup_page(form: &SignupForm, errors: &[FieldError]) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
<form method="post" action="/signup/">
<label for="username">Username</label>
<input id="username" name="username" maxlength="30" value="{username}">
{username_errors}
<label for="first_name">First name</label>
<input id="first_name" name="first_name" value="{first_name}">
{first_name_errors}
<label for="last_name">Last name</label>
<input id="last_name" name="last_name" value="{last_name}">
{last_name_errors}
<label for="email">Email</label>
<input id="email" name="email" value="{email}">
{email_errors}
<label for="password">Password</label>
<input id="password" name="password" type="password" placeholder="Password">
{password_errors}
<label for="repassword">Confirm password</label>
<input id="repassword" name="repassword" type="password" placeholder="Confirm Password">
{repassword_errors}
<p><button type="submit">Sign up</button></p>
</form>"#,
        username = escape(&form.username),
        username_errors = field_errors(errors, "username"),
        first_name = escape(&form.first_name),
        first_name_errors = field_errors(errors, "first_name"),
        last_name = escape(&form.last_name),
        last_name_errors = field_errors(errors, "last_name"),
        email = escape(&form.email),
        email_errors = field_errors(errors, "email"),
        password_errors = field_errors(errors, "password"),
        repassword_errors = field_errors(errors, "repassword"),
    );
    layout("Sign up", &Identity::Anonymous, &body)
}

pub fn login_page(form: &LoginForm, errors: &[FieldError], notice: Option<&str>) -> String {
    let notice = notice
        .map(|msg| format!(r#"<p class="notice">{}</p>"#, escape(msg)))
        .unwrap_or_default();
    let general_errors = field_errors(errors, "credentials");

    let body = format!(
        r#"<h1>Log in</h1>
{notice}
{general_errors}
<form method="post" action="/login/">
<label for="username">Username</label>
<input id="username" name="username" maxlength="30" value="{username}">
{username_errors}
<label for="password">Password</label>
<input id="password" name="password" type="password">
{password_errors}
<p><button type="submit">Log in</button></p>
</form>
<p>No account? <a href="/signup/">Sign up</a>.</p>"#,
        notice = notice,
        general_errors = general_errors,
        username = escape(&form.username),
        username_errors = field_errors(errors, "username"),
        password_errors = field_errors(errors, "password"),
    );
    layout("Log in", &Identity::Anonymous, &body)
}

pub fn error_page(identity: &Identity, status: u16, message: &str) -> String {
    let body = format!(
        r#"<h1>{status}</h1>
<p>{message}</p>
<p><a href="/">Back to the posts</a></p>"#,
        status = status,
        message = escape(message)
    );
    layout(&status.to_string(), identity, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::Post;
    use crate::domain::user::PublicProfile;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("plain"), "plain");
    }

    fn post_with_author(title: &str) -> PostWithAuthor {
        let author_id = Uuid::new_v4();
        PostWithAuthor {
            post: Post {
                id: 1,
                author_id,
                title: title.into(),
                content: "body".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            author: PublicProfile {
                id: author_id,
                username: "ada".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: "ada@example.com".into(),
            },
        }
    }

    #[test]
    fn home_page_escapes_user_content() {
        let found = post_with_author("<script>steal()</script>");
        let html = home_page(
            &Identity::Anonymous,
            std::slice::from_ref(&found),
            &PostForm::default(),
            &[],
        );
        assert!(!html.contains("<script>steal()"));
        assert!(html.contains("&lt;script&gt;steal()"));
    }

    #[test]
    fn owner_sees_edit_links_others_do_not() {
        let found = post_with_author("Hello");
        let owner = Identity::User(found.author.clone());

        let html = home_page(&owner, std::slice::from_ref(&found), &PostForm::default(), &[]);
        assert!(html.contains("/update/1"));
        assert!(html.contains("/delete/1"));

        let html = home_page(
            &Identity::Anonymous,
            std::slice::from_ref(&found),
            &PostForm::default(),
            &[],
        );
        assert!(!html.contains("/update/1"));
    }

    #[test]
    fn form_errors_render_inline() {
        let errors = vec![FieldError::new("title", "title is required")];
        let html = home_page(
            &Identity::User(post_with_author("x").author),
            &[],
            &PostForm::default(),
            &errors,
        );
        assert!(html.contains("title is required"));
    }

    #[test]
    fn login_page_shows_notice_and_credentials_error() {
        let html = login_page(&LoginForm::default(), &[], Some("Successfully registered."));
        assert!(html.contains("Successfully registered."));

        let errors = vec![FieldError::new("credentials", "Invalid credentials")];
        let html = login_page(&LoginForm::default(), &errors, None);
        assert!(html.contains("Invalid credentials"));
    }
}

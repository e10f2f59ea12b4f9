//! 用户管理 CLI 操作

use super::output::print_json;
use super::ui::{
    print_empty, print_header, print_hint, print_kv, print_section, print_success,
    print_table_header, print_table_row,
};
use super::OutputFormat;
use crate::client::handle_error;
use crossterm::style::Stylize;
use reqwest::Client;
use serde_json::{json, Value};
use userdesk_core::{LoginSuccess, Page, UserSummary};

/// `user list` 的分页/排序/搜索参数，原样传给 API
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

impl ListOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(n) = self.page_number {
            pairs.push(("page_number", n.to_string()));
        }
        if let Some(n) = self.page_size {
            pairs.push(("page_size", n.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// 用户登录
pub async fn login(
    client: &Client,
    base: &str,
    email: &str,
    password: &str,
    output: OutputFormat,
) -> anyhow::Result<LoginSuccess> {
    let url = format!("{}/authentication/login", base);
    let resp = client
        .post(&url)
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await?;
    let session: LoginSuccess = handle_error(resp).await?.json().await?;

    match output {
        OutputFormat::Json => print_json(&session)?,
        OutputFormat::Table => {
            print_header("🔐 Login berhasil");
            print_kv("User ID", &session.user_id);
            print_kv("Name", &session.name);
            print_kv("Email", &session.email);
            print_kv("Token", &session.token);
            print_section("💡 Tips");
            println!(
                "  Gunakan token ini lewat variabel: {}",
                "UD_TOKEN=<token>".cyan()
            );
        }
    }

    Ok(session)
}

/// 分页列出用户
pub async fn list_users(
    client: &Client,
    base: &str,
    options: &ListOptions,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users", base);
    let resp = client.get(&url).query(&options.query_pairs()).send().await?;
    let page: Page<UserSummary> = handle_error(resp).await?.json().await?;

    if output == OutputFormat::Json {
        return print_json(&page);
    }

    print_header("👥 Daftar pengguna");
    if page.data.is_empty() {
        print_empty("Tidak ada pengguna");
    } else {
        let columns = [("ID", 36), ("NAME", 20), ("EMAIL", 30)];
        print_table_header(&columns);
        for user in &page.data {
            print_table_row(&[
                (user.id.as_str(), 36),
                (user.name.as_str(), 20),
                (user.email.as_str(), 30),
            ]);
        }
    }
    println!();
    print_kv(
        "Halaman",
        &format!("{}/{}", page.page_number, page.total_pages.max(1)),
    );
    print_kv("Jumlah", &page.count.to_string());
    if page.has_next_page {
        print_hint(&format!(
            "halaman berikutnya: --page-number {}",
            page.page_number + 1
        ));
    }
    Ok(())
}

/// 获取用户详情
pub async fn get_user(
    client: &Client,
    base: &str,
    id: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users/{}", base, id);
    let resp = client.get(&url).send().await?;
    let user: UserSummary = handle_error(resp).await?.json().await?;
    print_user(&user, output)
}

/// 创建用户（确认密码与密码相同）
pub async fn create_user(
    client: &Client,
    base: &str,
    name: &str,
    email: &str,
    password: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users", base);
    let resp = client
        .post(&url)
        .json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirm": password
        }))
        .send()
        .await?;
    let user: UserSummary = handle_error(resp).await?.json().await?;

    if output == OutputFormat::Table {
        print_success(&format!("Pengguna {} dibuat", user.email));
    }
    print_user(&user, output)
}

/// 更新用户资料
pub async fn update_user(
    client: &Client,
    base: &str,
    id: &str,
    name: &str,
    email: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users/{}", base, id);
    let resp = client
        .put(&url)
        .json(&json!({ "name": name, "email": email }))
        .send()
        .await?;
    let user: UserSummary = handle_error(resp).await?.json().await?;

    if output == OutputFormat::Table {
        print_success("Data pengguna diperbarui");
    }
    print_user(&user, output)
}

/// 删除用户
pub async fn delete_user(
    client: &Client,
    base: &str,
    id: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users/{}", base, id);
    let resp = client.delete(&url).send().await?;
    let body: Value = handle_error(resp).await?.json().await?;

    match output {
        OutputFormat::Json => print_json(&body)?,
        OutputFormat::Table => print_success(&format!("Pengguna {} dihapus", id)),
    }
    Ok(())
}

/// 修改密码（需要旧密码）
pub async fn change_password(
    client: &Client,
    base: &str,
    id: &str,
    old: &str,
    new: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/users/{}/change-password", base, id);
    let resp = client
        .post(&url)
        .json(&json!({
            "password_old": old,
            "password_new": new,
            "password_confirm": new
        }))
        .send()
        .await?;
    let body: Value = handle_error(resp).await?.json().await?;

    match output {
        OutputFormat::Json => print_json(&body)?,
        OutputFormat::Table => print_success("Password berhasil diubah"),
    }
    Ok(())
}

fn print_user(user: &UserSummary, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Table => {
            print_section(&format!("👤 {}", user.name));
            print_kv("ID", &user.id);
            print_kv("Name", &user.name);
            print_kv("Email", &user.email);
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_only_send_given_params() {
        assert!(ListOptions::default().query_pairs().is_empty());

        let options = ListOptions {
            page_number: Some(2),
            page_size: None,
            sort: Some("name:desc".into()),
            search: None,
        };
        assert_eq!(
            options.query_pairs(),
            vec![
                ("page_number", "2".to_string()),
                ("sort", "name:desc".to_string())
            ]
        );
    }
}

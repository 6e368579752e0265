//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Site
title: My Blog
description: ''
author: John Doe
language: en
timezone: ''

# URL
url: http://example.com
blog_dir: blog

# Directory
content_dir: posts
public_dir: public
static_dir: static

# Writing
extensions: [md, markdown]
excerpt_separator: <!-- more -->
render_timeout_secs: 30
highlight:
  enable: true
  line_number: false
  theme: base16-ocean.dark

# Output
date_format: MMMM D, YYYY
feed_limit: 20
home_posts: 5
"#;

/// Initialize a new site in the given directory. Existing files are kept.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("posts"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG_TEMPLATE)?;

    let today = chrono::Local::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: The first post on this blog
published: true
tags:
  - meta
---

Welcome! This is the first post. Edit or delete it, then start writing.

<!-- more -->

## Writing posts

```bash
$ folio-rs new "My New Post"
```

New posts start as drafts (`published: false`). They get a page you can
preview by direct link, but stay out of the listing, the feed and the sitemap
until you flip the flag.

## Building the site

```bash
$ folio-rs generate
```
"#,
        today
    );
    write_if_missing(&target_dir.join("posts/hello-world.md"), &sample_post)?;

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, leaving it untouched", path);
        return Ok(());
    }
    fs::write(path, contents)?;
    tracing::debug!("Created {:?}", path);
    Ok(())
}

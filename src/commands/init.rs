//! Initialize a new site

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::Site;

const CONFIG_TEMPLATE: &str = r#"# Site settings
title: My Notes
description: ''
author: ''
lang: en

# URL
url: http://example.com
baseurl: ''
permalink: /:year/:month/:day/:title/

# Writing
default_layout: page
excerpt_separator: <!-- more -->
drafts: false
strict: false

highlight:
  enable: true
  theme: base16-ocean.dark
  line_numbers: false

exclude:
  - README.md
  - LICENSE*
"#;

const ABOUT_PAGE: &str = r#"---
layout: page
title: About me
subtitle: A few words about this site
---

Write something about yourself here.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(Site::CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists, refusing to overwrite it", config_path);
    }

    fs::create_dir_all(target_dir.join("_posts"))?;
    fs::create_dir_all(target_dir.join("_layouts"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {:?}", config_path))?;

    let today = chrono::Local::now().format("%Y-%m-%d");
    let welcome = format!(
        r#"---
layout: post
title: Welcome
subtitle: Your first post
tags: [welcome]
---

This post was generated by `quire init`. Edit or delete it, then run:

```bash
$ quire new "My New Post"
$ quire serve
```

<!-- more -->

## Layouts

Every document names its layout in the front matter. The built-in layouts are
`default`, `post` and `page`; drop a file with the same name into `_layouts/`
to replace one.
"#
    );

    fs::write(
        target_dir.join(format!("_posts/{}-welcome.md", today)),
        welcome,
    )?;
    fs::write(target_dir.join("about.md"), ABOUT_PAGE)?;

    Ok(())
}

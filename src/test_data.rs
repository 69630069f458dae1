#[cfg(test)]
pub const LEGACY_POST: &str = r#"# Deploying a static site

Today we ship the **blog** to the cloud.
[[img:media/architecture.png]]
The build step is simple:
```bash
npm run build
```
Then wire up the pipeline:
```mermaid
graph LR; Build-->Deploy
```
[[vid:https://cdn.example.com/demo.mp4]]
That's it. _Happy shipping!_
"#;

#[cfg(test)]
pub const HTML_POST: &str = r#"<h2>Moving to serverless</h2>
<p>We replaced the <strong>old</strong> servers <span onclick="track()">last week</span>.</p>
<p><img src="media/uploads/diagram.png" alt="diagram"></p>
<pre><code>terraform apply -auto-approve</code></pre>
<script>alert('x')</script>
<p>Questions? <a href="javascript:alert(1)">Ask</a></p>
"#;

#[cfg(test)]
pub const POST_RECORD_JSON: &str = r#"{
  "id": "a63bd715-a3fe-4788-b0e1-2a3153778544",
  "title": "**Deploying** a static site",
  "content": "Hello\n```js\nconsole.log(1)\n```\nWorld",
  "author": "journey-admin",
  "created_at": "2024-04-02T12:05:00Z"
}"#;

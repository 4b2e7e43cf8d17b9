//! Provider table for subdomain takeover detection.
//!
//! Order matters: the first rule whose DNS predicate matches owns the host.
//! Canonical names are fully qualified (trailing dot).

/// Heuristics for one hosting provider.
#[derive(Debug)]
pub struct Rule {
    /// Provider name used in the tag text.
    pub provider: &'static str,
    /// Canonical-name suffixes that identify the provider.
    pub cname_suffixes: &'static [&'static str],
    /// Canonical names that identify the provider exactly.
    pub cname_exact: &'static [&'static str],
    /// Addresses that identify the provider.
    pub addrs: &'static [&'static str],
    /// Body substrings served for unclaimed names.
    pub fingerprints: &'static [&'static str],
    /// An empty body is the unclaimed response.
    pub empty_body: bool,
    /// Remediation reference.
    pub reference: &'static str,
}

const fn cname_rule(
    provider: &'static str,
    cname_suffixes: &'static [&'static str],
    fingerprints: &'static [&'static str],
    reference: &'static str,
) -> Rule {
    Rule {
        provider,
        cname_suffixes,
        cname_exact: &[],
        addrs: &[],
        fingerprints,
        empty_body: false,
        reference,
    }
}

const fn exact_rule(
    provider: &'static str,
    cname_exact: &'static [&'static str],
    fingerprints: &'static [&'static str],
    reference: &'static str,
) -> Rule {
    Rule {
        provider,
        cname_suffixes: &[],
        cname_exact,
        addrs: &[],
        fingerprints,
        empty_body: false,
        reference,
    }
}

const fn addr_rule(
    provider: &'static str,
    addrs: &'static [&'static str],
    fingerprints: &'static [&'static str],
    reference: &'static str,
) -> Rule {
    Rule {
        provider,
        cname_suffixes: &[],
        cname_exact: &[],
        addrs,
        fingerprints,
        empty_body: false,
        reference,
    }
}

/// Every supported provider, in evaluation order.
pub static RULES: &[Rule] = &[
    addr_rule(
        "GitHub Pages",
        &[
            "185.199.108.153",
            "185.199.109.153",
            "185.199.110.153",
            "185.199.111.153",
        ],
        &[
            "There isn't a GitHub Pages site here.",
            "For root URLs (like http://example.com/) you must provide an index.html file",
        ],
        "https://help.github.com/articles/using-a-custom-domain-with-github-pages/",
    ),
    cname_rule(
        "Amazon S3",
        &[".amazonaws.com."],
        &["NoSuchBucket", "The specified bucket does not exist"],
        "https://docs.aws.amazon.com/AmazonS3/latest/dev/website-hosting-custom-domain-walkthrough.html",
    ),
    exact_rule(
        "Cargo Collective",
        &["subdomain.cargocollective.com."],
        &["404 Not Found"],
        "https://support.2.cargocollective.com/Using-a-Third-Party-Domain",
    ),
    cname_rule(
        "Ghost",
        &[".ghost.io."],
        &["The thing you were looking for is no longer here, or never was"],
        "https://docs.ghost.org/faq/using-custom-domains/",
    ),
    cname_rule(
        "Helpjuice",
        &[".helpjuice.com."],
        &["We could not find what you're looking for."],
        "https://help.helpjuice.com/34339-getting-started/custom-domain",
    ),
    cname_rule(
        "Help Scout",
        &[".helpscoutdocs.com."],
        &["No settings were found for this company:"],
        "https://docs.helpscout.net/article/42-setup-custom-domain",
    ),
    cname_rule(
        "Heroku",
        &[".herokudns.com.", ".herokuapp.com.", ".herokussl.com."],
        &["No such app"],
        "https://devcenter.heroku.com/articles/custom-domains",
    ),
    cname_rule(
        "JetBrains",
        &[".myjetbrains.com."],
        &["is not a registered InCloud YouTrack"],
        "https://www.jetbrains.com/help/youtrack/incloud/Domain-Settings.html#use-custom-domain-name",
    ),
    cname_rule(
        "Microsoft Azure",
        &[".azurewebsites.net."],
        &["404 Web Site not found"],
        "https://docs.microsoft.com/en-us/azure/app-service/app-service-web-tutorial-custom-domain",
    ),
    cname_rule(
        "Readme",
        &[".readme.io.", ".readmessl.com."],
        &["Project doesnt exist... yet!"],
        "https://readme.readme.io/docs/setting-up-custom-domain",
    ),
    Rule {
        provider: "Surge",
        cname_suffixes: &[],
        cname_exact: &["na-west1.surge.sh."],
        addrs: &["45.55.110.124"],
        fingerprints: &["project not found"],
        empty_body: false,
        reference: "https://surge.sh/help/adding-a-custom-domain",
    },
    Rule {
        provider: "Tumblr",
        cname_suffixes: &[],
        cname_exact: &["domains.tumblr.com."],
        addrs: &["66.6.44.4"],
        fingerprints: &["Whatever you were looking for doesn't currently exist at this address"],
        empty_body: false,
        reference: "https://tumblr.zendesk.com/hc/en-us/articles/231256548-Custom-domains",
    },
    cname_rule(
        "UserVoice",
        &[".uservoice.com."],
        &["This UserVoice subdomain is currently available!"],
        "https://developer.uservoice.com/docs/site/domain-aliasing/",
    ),
    cname_rule(
        "WordPress",
        &[".wordpress.com."],
        &["Do you want to register"],
        "https://en.support.wordpress.com/domains/map-subdomain/",
    ),
    Rule {
        provider: "SmugMug",
        cname_suffixes: &[],
        cname_exact: &["domains.smugmug.com."],
        addrs: &[],
        fingerprints: &[],
        empty_body: true,
        reference: "https://help.smugmug.com/use-a-custom-domain-BymMexwJVHG",
    },
    Rule {
        provider: "Strikingly",
        cname_suffixes: &[".s.strikinglydns.com."],
        cname_exact: &[],
        addrs: &["54.183.102.22"],
        fingerprints: &["But if you're looking to build your own website,"],
        empty_body: false,
        reference: "https://support.strikingly.com/hc/en-us/articles/215046947-Connect-Custom-Domain",
    },
    exact_rule(
        "Uptime Robot",
        &["stats.uptimerobot.com."],
        &["This public status page <b>does not seem to exist</b>."],
        "https://blog.uptimerobot.com/introducing-public-status-pages-yay/",
    ),
    cname_rule(
        "Pantheon",
        &[".pantheonsite.io."],
        &["The gods are wise"],
        "https://pantheon.io/docs/domains/",
    ),
    exact_rule(
        "Agile CRM",
        &["cname.agilecrm.com."],
        &["Sorry, this page is no longer available."],
        "https://www.agilecrm.com/custom-domains",
    ),
    cname_rule(
        "Kinsta",
        &[".kinsta.cloud."],
        &["No Site For Domain"],
        "https://kinsta.com/knowledgebase/add-domain/",
    ),
    cname_rule(
        "Campaign Monitor",
        &[".createsend.com."],
        &["Double check the URL or "],
        "https://help.campaignmonitor.com/custom-domain-names",
    ),
    cname_rule(
        "Gemfury",
        &[".furyns.com."],
        &["404: This page could not be found."],
        "https://gemfury.com/help/custom-domains/",
    ),
    cname_rule(
        "LaunchRock",
        &[".launchrock.com."],
        &["It looks like you may have taken a wrong turn somewhere. Don't worry...it happens to all of us."],
        "https://help.launchrock.com/support/solutions/articles/1000087021-cname-general-instructions-for-creating-your-cname-record-",
    ),
    cname_rule(
        "Big Cartel",
        &[".bigcartel.com."],
        &["<h1>Oops! We couldn&#8217;t find that page.</h1>"],
        "https://help.bigcartel.com/other-domain-providers",
    ),
    cname_rule(
        "Teamwork",
        &[".teamwork.com."],
        &["Oops - We didn't find your site."],
        "https://support.teamwork.com/projects/general-settings/using-a-custom-domain-name",
    ),
    cname_rule(
        "Shopify",
        &[".myshopify.com."],
        &["Only one step left", "Sorry, this shop is currently unavailable."],
        "https://help.shopify.com/en/manual/online-store/domains/add-a-domain/using-existing-domains/connecting-domains",
    ),
    cname_rule(
        "Bitbucket",
        &[".bitbucket.io."],
        &["Repository not found"],
        "https://support.atlassian.com/bitbucket-cloud/docs/publishing-a-website-on-bitbucket-cloud/",
    ),
    cname_rule(
        "Intercom",
        &["custom.intercom.help."],
        &["This page is reserved for artistic dogs."],
        "https://developers.intercom.com/installing-intercom/docs/set-up-your-custom-domain",
    ),
    addr_rule(
        "Worksites",
        &["69.164.223.206"],
        &["Company Not Found"],
        "https://worksites.net/support/how-to-use-a-custom-domain-name",
    ),
    addr_rule(
        "SmartJobBoard",
        &["52.16.160.97"],
        &["This job board website is either expired or its domain name is invalid."],
        "https://help.smartjobboard.com/en/articles/1269655-connecting-a-custom-domain-name",
    ),
    cname_rule(
        "Pingdom",
        &["stats.pingdom.com."],
        &["Sorry, couldn't find the status page"],
        "https://documentation.solarwinds.com/en/success_center/pingdom/content/topics/public-status-page.htm?cshid=pd-rd_205386171-public-status-page",
    ),
    cname_rule(
        "Ngrok",
        &[".cname.ngrok.io."],
        &["Tunnel *.ngrok.io not found"],
        "https://ngrok.com/docs#http-custom-domains",
    ),
];

//! efetch XML through tree conversion, normalization and date standardization.

use pubmed_scraper::record::{normalize, NO_ABSTRACT, NO_KEYWORDS};
use pubmed_scraper::{dates, xml_tree, NormalizedRow};

const EFETCH_BODY: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM" IndexingMethod="Automated">
      <PMID Version="1">31000001</PMID>
      <Article PubModel="Print-Electronic">
        <Journal>
          <ISSN IssnType="Electronic">1234-5678</ISSN>
          <JournalIssue CitedMedium="Internet">
            <Volume>12</Volume>
            <PubDate>
              <MedlineDate>1998 Dec-1999 Jan</MedlineDate>
            </PubDate>
          </JournalIssue>
          <Title>Journal of Respiratory Research</Title>
        </Journal>
        <ArticleTitle>Effects of <i>E. coli</i> exposure on H<sub>2</sub>O retention</ArticleTitle>
        <ELocationID EIdType="pii" ValidYN="Y">S0000-0000(98)00001-1</ELocationID>
        <ELocationID EIdType="doi" ValidYN="Y">10.9999/eloc.1</ELocationID>
        <Abstract>
          <AbstractText Label="BACKGROUND" NlmCategory="BACKGROUND">Asthma is common.</AbstractText>
          <AbstractText Label="RESULTS" NlmCategory="RESULTS">Exposure raised retention by 5<sup>%</sup>.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y">
            <LastName>Doe</LastName>
            <ForeName>Jane</ForeName>
            <Initials>J</Initials>
            <AffiliationInfo><Affiliation>Somewhere University.</Affiliation></AffiliationInfo>
          </Author>
          <Author ValidYN="Y">
            <CollectiveName>Asthma Study Group</CollectiveName>
          </Author>
        </AuthorList>
        <Language>eng</Language>
      </Article>
      <KeywordList Owner="NOTNLM">
        <Keyword MajorTopicYN="N">asthma</Keyword>
        <Keyword MajorTopicYN="N">Inflammation</Keyword>
      </KeywordList>
      <KeywordList Owner="NLM">
        <Keyword MajorTopicYN="Y">inflammation</Keyword>
        <Keyword MajorTopicYN="N">cytokines</Keyword>
      </KeywordList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">31000001</ArticleId>
        <ArticleId IdType="doi">10.1000/xyz.31000001</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation Status="PubMed-not-MEDLINE" Owner="NLM">
      <PMID Version="1">31000002</PMID>
      <Article PubModel="Electronic">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <PubDate><Year>2021</Year><Month>Sep</Month><Day>07</Day></PubDate>
          </JournalIssue>
          <Title>Open Lung</Title>
        </Journal>
        <ArticleTitle>A short note</ArticleTitle>
        <ELocationID EIdType="doi" ValidYN="Y">10.9999/eloc.2</ELocationID>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Roe</LastName><ForeName>Richard</ForeName></Author>
        </AuthorList>
        <Language>fre</Language>
      </Article>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">31000002</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

fn rows() -> Vec<NormalizedRow> {
    let records = xml_tree::parse_article_set(EFETCH_BODY).unwrap();
    let mut rows: Vec<NormalizedRow> = records.iter().filter_map(normalize).collect();
    dates::standardize(&mut rows);
    rows
}

#[test]
fn structured_record_fills_every_column() {
    let rows = rows();
    assert_eq!(rows.len(), 2);
    let row = &rows[0];

    assert_eq!(row.pmid, "31000001");
    assert_eq!(row.title, "Effects of E. coli exposure on H2O retention");
    assert_eq!(row.abstract_text, "Asthma is common. Exposure raised retention by 5%.");
    assert_eq!(row.journal, "Journal of Respiratory Research");
    assert_eq!(row.language, "eng");
    assert_eq!(row.authors, "Doe J; Asthma Study Group");
    assert_eq!(row.keywords, "asthma; Inflammation; cytokines");
    assert_eq!(row.doi, "10.1000/xyz.31000001");
}

#[test]
fn medline_date_standardized() {
    let row = &rows()[0];
    assert_eq!((row.year.as_str(), row.month.as_str(), row.day.as_str()), ("1998", "12", "1"));
}

#[test]
fn sparse_record_falls_back() {
    let row = &rows()[1];

    assert_eq!(row.pmid, "31000002");
    assert_eq!(row.abstract_text, NO_ABSTRACT);
    assert_eq!(row.keywords, NO_KEYWORDS);
    assert_eq!(row.authors, "Roe Richard");
    assert_eq!(row.language, "fre");
    assert_eq!(row.doi, "10.9999/eloc.2");
    assert_eq!((row.year.as_str(), row.month.as_str(), row.day.as_str()), ("2021", "9", "7"));
}
